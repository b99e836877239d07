/// Authentication Routes
///
/// Login, access token refresh, and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_from_headers, SessionService};
use crate::error::AppError;
use crate::routes::users::UserResponse;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested access token lifetime; clamped to the server ceiling
    #[serde(default, alias = "expires_in")]
    pub expires_in_seconds: Option<i64>,
}

/// Login response: profile plus a token pair
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token_type: &'static str,
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token_type: &'static str,
    pub access_token: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// POST /api/login
///
/// Authenticate with email and password.
///
/// # Errors
/// - 400: Malformed body
/// - 401: Unknown email or wrong password (indistinguishable)
/// - 500: Storage failure
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let outcome = sessions
        .login(&form.email, &form.password, form.expires_in_seconds)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(&outcome.user),
        token_type: "Bearer",
        access_token: outcome.access_token,
        expires_in: outcome.expires_in,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Mint a new access token from `Authorization: Bearer <refresh token>`.
///
/// # Errors
/// - 400: Missing or malformed Authorization header
/// - 401: Unknown, expired or revoked refresh token (indistinguishable)
/// - 500: Storage failure
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_from_headers(req.headers())?;
    let outcome = sessions.refresh(&token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        token_type: "Bearer",
        access_token: outcome.access_token,
        expires_in: outcome.expires_in,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/revoke
///
/// Revoke the refresh token in `Authorization: Bearer <refresh token>`.
/// Idempotent; answers 204 whether or not the token was known.
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_from_headers(req.headers())?;
    sessions.revoke(&token).await?;

    Ok(HttpResponse::NoContent().finish())
}
