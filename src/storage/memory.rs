use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    ChirpRecord, ChirpStore, RefreshTokenRecord, RefreshTokenRepository, UserDirectory,
    UserRecord,
};
use crate::error::DatabaseError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    /// Insertion order is creation order.
    chirps: Vec<ChirpRecord>,
}

impl Tables {
    fn require_user(&self, user_id: Uuid, constraint: &str) -> Result<(), DatabaseError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKeyViolation(constraint.to_string()))
        }
    }
}

/// Process-local stand-in for the Postgres schema.
///
/// One lock covers all three tables so that `delete_all` cascades atomically
/// and refresh tokens and chirps must reference an existing user, as the
/// migrations require. Share one `Arc<InMemoryStore>` between every
/// collaborator that needs it.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, DatabaseError> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::UnexpectedError("in-memory store poisoned".to_string()))
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn create(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.lock()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let mut tables = self.lock()?;
        let removed = tables.users.len() as u64;
        // ON DELETE CASCADE
        tables.users.clear();
        tables.refresh_tokens.clear();
        tables.chirps.clear();
        Ok(removed)
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        let mut tables = self.lock()?;
        if tables.refresh_tokens.contains_key(&record.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            ));
        }
        tables.require_user(record.user_id, "refresh_tokens_user_id_fkey")?;

        tables
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        Ok(self.lock()?.refresh_tokens.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut tables = self.lock()?;
        match tables.refresh_tokens.get_mut(token) {
            None => Ok(0),
            Some(record) => {
                if record.revoked_at.is_none() {
                    record.revoked_at = Some(at);
                    record.updated_at = at;
                }
                Ok(1)
            }
        }
    }

    async fn revoke_if_active(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let mut tables = self.lock()?;
        match tables.refresh_tokens.get_mut(token) {
            Some(record) if record.revoked_at.is_none() && record.expires_at > at => {
                record.revoked_at = Some(at);
                record.updated_at = at;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl ChirpStore for InMemoryStore {
    async fn create_chirp(
        &self,
        user_id: Uuid,
        body: &str,
    ) -> Result<ChirpRecord, DatabaseError> {
        let mut tables = self.lock()?;
        tables.require_user(user_id, "chirps_user_id_fkey")?;

        let now = Utc::now();
        let chirp = ChirpRecord {
            id: Uuid::new_v4(),
            body: body.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        tables.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, DatabaseError> {
        Ok(self.lock()?.chirps.clone())
    }

    async fn find_chirp(&self, id: Uuid) -> Result<Option<ChirpRecord>, DatabaseError> {
        Ok(self.lock()?.chirps.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.lock()?;
        let before = tables.chirps.len();
        tables.chirps.retain(|c| c.id != id);
        Ok((before - tables.chirps.len()) as u64)
    }
}
