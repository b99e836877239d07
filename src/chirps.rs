/// Chirps
///
/// Short posts authored by an authenticated user. Bodies are limited to
/// 140 characters and a small list of words is masked before storage.
/// Only the author may delete a chirp.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AuthError, DatabaseError, ResourceError, ValidationError};
use crate::storage::{ChirpRecord, ChirpStore};

pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

/// Check the length limit. Counted in characters, not bytes.
pub fn validate_chirp_body(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::EmptyField("body".to_string()));
    }
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("body".to_string(), MAX_CHIRP_LENGTH));
    }
    Ok(())
}

/// Replace each space-separated word that equals a profane word
/// (case-insensitively) with `****`. Words with attached punctuation are kept.
pub fn clean_chirp_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            if PROFANE_WORDS.contains(&lower.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct ChirpService {
    store: Arc<dyn ChirpStore>,
}

impl ChirpService {
    pub fn new(store: Arc<dyn ChirpStore>) -> Self {
        Self { store }
    }

    /// Validate, clean and store a chirp for `author`.
    ///
    /// # Errors
    /// - Validation: empty or too long
    /// - Auth: `UnknownUser` when the author no longer exists
    pub async fn create(&self, author: Uuid, body: &str) -> Result<ChirpRecord, AppError> {
        validate_chirp_body(body)?;
        let cleaned = clean_chirp_body(body);

        let chirp = self
            .store
            .create_chirp(author, &cleaned)
            .await
            .map_err(|e| match e {
                DatabaseError::ForeignKeyViolation(_) => AppError::from(AuthError::UnknownUser),
                other => other.into(),
            })?;

        tracing::info!(chirp_id = %chirp.id, user_id = %author, "Chirp created");
        Ok(chirp)
    }

    pub async fn list(&self) -> Result<Vec<ChirpRecord>, AppError> {
        Ok(self.store.list_chirps().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<ChirpRecord, AppError> {
        self.store
            .find_chirp(id)
            .await?
            .ok_or_else(|| ResourceError::NotFound("chirp".to_string()).into())
    }

    /// Delete a chirp owned by `caller`.
    ///
    /// # Errors
    /// - Resource: `NotFound` for an unknown id, `Forbidden` for someone else's chirp
    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<(), AppError> {
        let chirp = self.get(id).await?;
        if chirp.user_id != caller {
            tracing::warn!(chirp_id = %id, user_id = %caller, "Delete of foreign chirp refused");
            return Err(ResourceError::Forbidden("chirp".to_string()).into());
        }

        if self.store.delete_chirp(id).await? == 0 {
            return Err(ResourceError::NotFound("chirp".to_string()).into());
        }

        tracing::info!(chirp_id = %id, user_id = %caller, "Chirp deleted");
        Ok(())
    }
}
