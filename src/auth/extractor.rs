/// Access token extractor
///
/// Handlers that take an `AuthenticatedUser` argument only run when the
/// request carries `Authorization: Bearer <access token>` with a valid token.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::bearer::bearer_from_headers;
use crate::auth::session::SessionService;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let sessions = req
        .app_data::<web::Data<SessionService>>()
        .ok_or_else(|| AppError::Internal("SessionService is not registered".to_string()))?;

    let token = bearer_from_headers(req.headers())?;
    let user_id = sessions.authenticate(&token)?;

    tracing::debug!(user_id = %user_id, "Access token accepted");
    Ok(AuthenticatedUser { user_id })
}
