/// Refresh Token Store
///
/// Refresh tokens are:
/// - 32 random bytes from the OS-seeded CSPRNG, hex encoded (256 bits)
/// - Valid for 60 days from issuance; use never extends them
/// - Revocable exactly once; revocation is permanent
/// - Never deleted by this module
///
/// `resolve` reports NotFound, Revoked and Expired as distinct `AuthError`s
/// for logging. They share one public outcome (see `crate::error`).

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AuthError};
use crate::storage::{RefreshTokenRecord, RefreshTokenRepository};

/// Lifetime of a refresh token, fixed at issuance.
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 60;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new opaque refresh token string
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Short, non-reversible identifier for a token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

impl RefreshTokenRecord {
    /// Active-token check, revoked wins over expired.
    fn owner_at(&self, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        if self.revoked_at.is_some() {
            return Err(AuthError::RefreshTokenRevoked);
        }
        if self.expires_at <= now {
            return Err(AuthError::RefreshTokenExpired);
        }
        Ok(self.user_id)
    }
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repository }
    }

    /// Mint and persist a token for `user_id`, returning the raw string.
    ///
    /// # Errors
    /// A token collision surfaces as `DatabaseError::UniqueConstraintViolation`;
    /// it is not retried.
    pub async fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let record = RefreshTokenRecord {
            token: generate_refresh_token(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
            revoked_at: None,
        };

        self.repository.insert(&record).await?;

        tracing::info!(
            user_id = %user_id,
            token = %token_fingerprint(&record.token),
            expires_at = %record.expires_at.to_rfc3339(),
            "Refresh token issued"
        );
        Ok(record.token)
    }

    /// Resolve a presented token to its owner.
    ///
    /// # Errors
    /// - `AuthError::RefreshTokenNotFound` / `RefreshTokenRevoked` / `RefreshTokenExpired`
    /// - `AppError::Database` if the lookup itself fails
    pub async fn resolve(&self, token: &str) -> Result<Uuid, AppError> {
        let record = self.repository.find(token).await?.ok_or_else(|| {
            tracing::warn!(token = %token_fingerprint(token), "Refresh token not found");
            AuthError::RefreshTokenNotFound
        })?;

        record.owner_at(Utc::now()).map_err(|cause| {
            tracing::warn!(
                user_id = %record.user_id,
                token = %token_fingerprint(token),
                cause = ?cause,
                "Refresh token rejected"
            );
            cause.into()
        })
    }

    /// Revoke a token. Revoking an already revoked token succeeds.
    ///
    /// # Errors
    /// `AuthError::RefreshTokenNotFound` when no such token exists
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        let matched = self.repository.mark_revoked(token, Utc::now()).await?;
        if matched == 0 {
            return Err(AuthError::RefreshTokenNotFound.into());
        }

        tracing::info!(token = %token_fingerprint(token), "Refresh token revoked");
        Ok(())
    }

    /// Revoke a token that must still be active, for single-use rotation.
    ///
    /// Unlike `revoke`, this fails when the token was already revoked, so of
    /// two concurrent callers presenting the same token only one gets `Ok`.
    ///
    /// # Errors
    /// `AuthError::RefreshTokenRevoked` when the token was no longer active
    pub async fn consume(&self, token: &str) -> Result<(), AppError> {
        let changed = self.repository.revoke_if_active(token, Utc::now()).await?;
        if changed != 1 {
            tracing::warn!(
                token = %token_fingerprint(token),
                "Refresh token reused during rotation"
            );
            return Err(AuthError::RefreshTokenRevoked.into());
        }

        tracing::info!(token = %token_fingerprint(token), "Refresh token consumed");
        Ok(())
    }
}
