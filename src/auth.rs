use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Signing material and lifetime for issued bearer tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    secret: String,
    expires_secs: i64,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, expires_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            expires_secs,
        }
    }

    pub fn issue_token(&self, client_id: Uuid, email: &str, role: &str) -> Result<String, AppError> {
        let claims = Claims {
            sub: client_id,
            email: email.to_string(),
            role: role.to_string(),
            exp: (Utc::now().timestamp() + self.expires_secs) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))
    }
}

/// Bearer-token claims.
///
/// Usable directly as a handler argument to protect a route: no
/// `Authorization` header is 403, a bad or expired token 401.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

fn claims_from_request(req: &HttpRequest) -> Result<Claims, AppError> {
    let auth = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(|| AppError::Internal("auth config not registered".to_string()))?;
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingToken)?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header);
    auth.verify_token(token)
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret", 3600)
    }

    #[test]
    fn issued_token_round_trips() {
        let auth = config();
        let client_id = Uuid::new_v4();

        let token = auth
            .issue_token(client_id, "jean.dupont@example.com", "client")
            .expect("issue failed");
        let claims = auth.verify_token(&token).expect("verify failed");

        assert_eq!(claims.sub, client_id);
        assert_eq!(claims.email, "jean.dupont@example.com");
        assert_eq!(claims.role, "client");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = AuthConfig::new("other-secret", 3600)
            .issue_token(Uuid::new_v4(), "a@b.c", "client")
            .expect("issue failed");

        let err = config().verify_token(&token).expect_err("should reject");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative lifetime puts exp in the past.
        let auth = AuthConfig::new("test-secret", -3600);
        let token = auth
            .issue_token(Uuid::new_v4(), "a@b.c", "client")
            .expect("issue failed");

        let err = auth.verify_token(&token).expect_err("should reject");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = config()
            .verify_token("not-a-jwt")
            .expect_err("should reject");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("caravane").expect("hash failed");

        assert!(verify_password("caravane", &hash).expect("verify failed"));
        assert!(!verify_password("wrong", &hash).expect("verify failed"));
    }
}
