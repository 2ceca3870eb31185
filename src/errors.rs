use actix_web::HttpResponse;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Order {order_id} partially written: lines {failed_lines:?} failed")]
    PartialFailure {
        order_id: Uuid,
        failed_lines: Vec<usize>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::ProductNotFound(id) => AppError::NotFound(format!("product {id}")),
            DomainError::Store(msg) => AppError::Internal(msg),
            DomainError::PartialFailure {
                order_id,
                failed_lines,
            } => AppError::PartialFailure {
                order_id,
                failed_lines,
            },
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::MissingToken => HttpResponse::Forbidden().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": self.to_string()
            })),
            // The header was committed; the body names what is missing so
            // the caller can reconcile instead of resubmitting blindly.
            AppError::PartialFailure {
                order_id,
                failed_lines,
            } => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "order partially written",
                "order_id": order_id,
                "failed_lines": failed_lines
            })),
            AppError::Internal(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn validation_returns_400() {
        let resp = AppError::Validation("bad".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_returns_401() {
        let resp = AppError::Unauthorized("nope".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn missing_token_returns_403() {
        let resp = AppError::MissingToken.error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("product".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn partial_failure_returns_500() {
        let err = AppError::PartialFailure {
            order_id: Uuid::new_v4(),
            failed_lines: vec![1, 3],
        };
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_product_not_found_maps_to_not_found() {
        let app_err: AppError = DomainError::ProductNotFound(Uuid::new_v4()).into();
        assert!(matches!(app_err, AppError::NotFound(_)));
    }

    #[test]
    fn domain_validation_maps_to_validation() {
        let app_err: AppError = DomainError::Validation("empty".to_string()).into();
        assert!(matches!(app_err, AppError::Validation(_)));
    }

    #[test]
    fn domain_store_maps_to_internal() {
        let app_err: AppError = DomainError::Store("connection reset".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[test]
    fn domain_partial_failure_keeps_failed_lines() {
        let order_id = Uuid::new_v4();
        let app_err: AppError = DomainError::PartialFailure {
            order_id,
            failed_lines: vec![2],
        }
        .into();
        match app_err {
            AppError::PartialFailure {
                order_id: id,
                failed_lines,
            } => {
                assert_eq!(id, order_id);
                assert_eq!(failed_lines, vec![2]);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }
}
