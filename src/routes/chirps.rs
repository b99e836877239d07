/// Chirp Routes
///
/// Create, list, fetch and delete chirps. Creating and deleting require an
/// access token; reading is public.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::chirps::ChirpService;
use crate::error::{AppError, ResourceError};
use crate::storage::ChirpRecord;

#[derive(Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Serialize)]
pub struct ChirpResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub body: String,
    pub user_id: String,
}

impl From<&ChirpRecord> for ChirpResponse {
    fn from(chirp: &ChirpRecord) -> Self {
        Self {
            id: chirp.id.to_string(),
            created_at: chirp.created_at.to_rfc3339(),
            updated_at: chirp.updated_at.to_rfc3339(),
            body: chirp.body.clone(),
            user_id: chirp.user_id.to_string(),
        }
    }
}

/// Path ids that are not UUIDs cannot name a chirp.
fn chirp_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| ResourceError::NotFound("chirp".to_string()).into())
}

/// POST /api/chirps
///
/// # Errors
/// - 400: Empty or longer than 140 characters
/// - 401: Invalid access token
pub async fn create_chirp(
    caller: AuthenticatedUser,
    form: web::Json<CreateChirpRequest>,
    chirps: web::Data<ChirpService>,
) -> Result<HttpResponse, AppError> {
    let chirp = chirps.create(caller.user_id, &form.body).await?;
    Ok(HttpResponse::Created().json(ChirpResponse::from(&chirp)))
}

/// GET /api/chirps
pub async fn list_chirps(chirps: web::Data<ChirpService>) -> Result<HttpResponse, AppError> {
    let listed: Vec<ChirpResponse> = chirps.list().await?.iter().map(ChirpResponse::from).collect();
    Ok(HttpResponse::Ok().json(listed))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<String>,
    chirps: web::Data<ChirpService>,
) -> Result<HttpResponse, AppError> {
    let chirp = chirps.get(chirp_id(&path)?).await?;
    Ok(HttpResponse::Ok().json(ChirpResponse::from(&chirp)))
}

/// DELETE /api/chirps/{chirp_id}
///
/// # Errors
/// - 403: Caller is not the author
/// - 404: No such chirp
pub async fn delete_chirp(
    caller: AuthenticatedUser,
    path: web::Path<String>,
    chirps: web::Data<ChirpService>,
) -> Result<HttpResponse, AppError> {
    chirps.delete(caller.user_id, chirp_id(&path)?).await?;
    Ok(HttpResponse::NoContent().finish())
}
