use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{self, AuthConfig};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::client::{Client, NewClient};
use crate::schema::clients;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Defaults to "client".
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub client_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub client: ClientSummary,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/clients/register
///
/// Creates a client account. The password is bcrypt-hashed before it
/// touches the database; a duplicate email is rejected.
#[utoipa::path(
    post,
    path = "/api/clients/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Email already registered"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "clients"
)]
pub async fn register(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let client_id = web::block(move || {
        let mut conn = pool.get()?;

        let taken: i64 = clients::table
            .filter(clients::email.eq(&body.email))
            .count()
            .get_result(&mut conn)?;
        if taken > 0 {
            return Err(AppError::Validation("email already registered".to_string()));
        }

        let password_hash = auth::hash_password(&body.password)?;
        let client_id = Uuid::new_v4();
        diesel::insert_into(clients::table)
            .values(&NewClient {
                id: client_id,
                first_name: body.first_name,
                last_name: body.last_name,
                email: body.email,
                password_hash,
                address: body.address,
                phone: body.phone,
                role: body.role.unwrap_or_else(|| "client".to_string()),
            })
            .execute(&mut conn)
            .map_err(|e| match e {
                // Two concurrent registrations can pass the pre-check; the
                // unique index settles it.
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    AppError::Validation("email already registered".to_string())
                }
                other => AppError::from(other),
            })?;

        Ok::<_, AppError>(client_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(RegisterResponse { client_id }))
}

/// POST /api/clients/login
///
/// Verifies the credentials and issues a signed bearer token. An
/// unknown email is 404, a wrong password 401.
#[utoipa::path(
    post,
    path = "/api/clients/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown email"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "clients"
)]
pub async fn login(
    pool: web::Data<DbPool>,
    auth_config: web::Data<AuthConfig>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let client = web::block(move || {
        let mut conn = pool.get()?;

        let client = clients::table
            .filter(clients::email.eq(&body.email))
            .select(Client::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(client) = client else {
            return Err(AppError::NotFound("client".to_string()));
        };

        if !auth::verify_password(&body.password, &client.password_hash)? {
            return Err(AppError::Unauthorized("incorrect credentials".to_string()));
        }

        Ok::<_, AppError>(client)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let token = auth_config.issue_token(client.id, &client.email, &client.role)?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        client: ClientSummary {
            id: client.id,
            first_name: client.first_name,
            last_name: client.last_name,
            email: client.email,
        },
    }))
}

/// PUT /api/clients/{id}/password
///
/// Replaces the password after verifying the current one.
#[utoipa::path(
    put,
    path = "/api/clients/{id}/password",
    params(
        ("id" = Uuid, Path, description = "Client UUID"),
    ),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 401, description = "Current password does not match"),
        (status = 404, description = "Unknown client"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "clients"
)]
pub async fn change_password(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let client_id = path.into_inner();
    let body = body.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;

        let stored: Option<String> = clients::table
            .filter(clients::id.eq(client_id))
            .select(clients::password_hash)
            .first(&mut conn)
            .optional()?;
        let Some(stored) = stored else {
            return Err(AppError::NotFound("client".to_string()));
        };

        if !auth::verify_password(&body.current_password, &stored)? {
            return Err(AppError::Unauthorized(
                "current password does not match".to_string(),
            ));
        }

        let new_hash = auth::hash_password(&body.new_password)?;
        diesel::update(clients::table.filter(clients::id.eq(client_id)))
            .set(clients::password_hash.eq(new_hash))
            .execute(&mut conn)?;

        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "password updated" })))
}
