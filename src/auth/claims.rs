/// Access token claim set
///
/// Standard JWT claims (RFC 7519) only: who, when, by whom. Nothing about the
/// user beyond the subject is embedded.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed issuer for every access token this service mints.
pub const ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Claims for `user_id`, valid for `ttl` from now.
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: now + ttl.num_seconds(),
            iat: now,
            iss: ISSUER.to_string(),
        }
    }

    /// Parse the subject back into a user ID
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Expired once `exp` is no longer strictly in the future.
    pub fn is_expired(&self) -> bool {
        self.exp <= chrono::Utc::now().timestamp()
    }

    pub fn lifetime_seconds(&self) -> i64 {
        self.exp - self.iat
    }
}
