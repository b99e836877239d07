/// Persistence collaborators
///
/// The auth core and the chirp service talk to storage only through these
/// traits. `postgres` backs them with sqlx. `memory` keeps all three tables in
/// one process-local store with the same foreign keys and cascades as the
/// migrations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PgChirpStore, PgRefreshTokenRepository, PgUserDirectory};

/// A user row. `hashed_password` is the stored credential.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted refresh token.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `None` while the token is active. Never cleared once set.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// A stored chirp. `body` is already cleaned.
#[derive(Debug, Clone, PartialEq)]
pub struct ChirpRecord {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with `UniqueConstraintViolation` when the email is taken.
    async fn create(&self, email: &str, hashed_password: &str)
        -> Result<UserRecord, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError>;

    /// Replace email and credential. `None` when no such user exists.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<UserRecord>, DatabaseError>;

    /// Remove every user, cascading to their refresh tokens and chirps.
    /// Returns the number of users removed.
    async fn delete_all(&self) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Fails with `UniqueConstraintViolation` if the token string already exists.
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError>;

    /// Exact-match lookup, regardless of expiry or revocation.
    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError>;

    /// Set `revoked_at` to `at` unless it is already set.
    ///
    /// Returns the number of rows matching `token`: `0` means no such token.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<u64, DatabaseError>;

    /// Revoke `token` only if it is still active at `at` (not revoked, not expired).
    ///
    /// Returns the number of rows changed. Of several concurrent callers on the
    /// same token, at most one sees `1`.
    async fn revoke_if_active(&self, token: &str, at: DateTime<Utc>)
        -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    /// Fails with `ForeignKeyViolation` when `user_id` is not a known user.
    async fn create_chirp(&self, user_id: Uuid, body: &str)
        -> Result<ChirpRecord, DatabaseError>;

    /// All chirps, oldest first.
    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, DatabaseError>;

    async fn find_chirp(&self, id: Uuid) -> Result<Option<ChirpRecord>, DatabaseError>;

    /// Returns the number of rows removed.
    async fn delete_chirp(&self, id: Uuid) -> Result<u64, DatabaseError>;
}
