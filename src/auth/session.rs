/// Session Façade
///
/// Login, refresh and revoke flows built from the hasher, the access token
/// codec, and the refresh token store. Per refresh token the lifecycle is
///
/// ```text
/// Anonymous --login--> Authenticated --refresh--> Refreshed --refresh--> ...
///      any --revoke--> Revoked (terminal)
/// ```
///
/// Refresh does NOT rotate the refresh token by default: a stolen refresh token
/// stays usable until it expires or is revoked. Set
/// `SessionPolicy::rotate_refresh_tokens` to revoke and reissue on every refresh;
/// the presented token is then single-use, even under concurrent replay.
/// There is also no throttling of login or refresh attempts here; that belongs
/// in front of this service.

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::jwt::{issue_access_token, validate_access_token};
use crate::auth::password::{validate_password_strength, CredentialHasher, Verification};
use crate::auth::refresh_token::RefreshTokenStore;
use crate::auth::secret::SigningSecret;
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::storage::{RefreshTokenRepository, UserDirectory, UserRecord};
use crate::validators::is_valid_email;

/// Ceiling on access token lifetime, and the lifetime used when none is requested.
pub const ACCESS_TOKEN_MAX_TTL_SECS: i64 = 3600;

/// Requested lifetimes that are absent, non-positive, or above the ceiling get the ceiling.
pub fn clamp_access_ttl(requested_secs: Option<i64>) -> Duration {
    match requested_secs {
        Some(secs) if secs > 0 && secs <= ACCESS_TOKEN_MAX_TTL_SECS => Duration::seconds(secs),
        _ => Duration::seconds(ACCESS_TOKEN_MAX_TTL_SECS),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPolicy {
    pub rotate_refresh_tokens: bool,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

#[derive(Debug)]
pub struct RefreshOutcome {
    pub user_id: Uuid,
    pub access_token: String,
    pub expires_in: i64,
    /// Only set when rotation is enabled.
    pub refresh_token: Option<String>,
}

pub struct SessionService {
    users: Arc<dyn UserDirectory>,
    refresh_tokens: RefreshTokenStore,
    secret: SigningSecret,
    hasher: CredentialHasher,
    policy: SessionPolicy,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        refresh_repository: Arc<dyn RefreshTokenRepository>,
        secret: SigningSecret,
        hasher: CredentialHasher,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokenStore::new(refresh_repository),
            secret,
            hasher,
            policy,
        }
    }

    pub fn users(&self) -> &Arc<dyn UserDirectory> {
        &self.users
    }

    /// Create an account. The password is strength-checked, then hashed.
    ///
    /// # Errors
    /// - Validation: bad email, weak password, email already registered
    /// - Internal: hashing failure
    pub async fn register(&self, email: &str, password: &str) -> Result<UserRecord, AppError> {
        let email = is_valid_email(email)?;
        validate_password_strength(password)?;
        let hashed = self
            .hasher
            .hash(password)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let user = self
            .users
            .create(&email, &hashed)
            .await
            .map_err(email_conflict)?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown email and wrong password both fail with an `AuthError`, which the
    /// boundary reports as a plain 401. Storage failures stay internal errors.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_secs: Option<i64>,
    ) -> Result<LoginOutcome, AppError> {
        let user = match self.users.find_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                self.hasher.verify_decoy(password);
                return Err(AuthError::UnknownEmail.into());
            }
        };

        if self.hasher.verify(password, &user.hashed_password) != Verification::Match {
            return Err(AuthError::PasswordMismatch.into());
        }

        let ttl = clamp_access_ttl(requested_ttl_secs);
        let access_token = issue_access_token(user.id, &self.secret, ttl)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;

        tracing::info!(user_id = %user.id, expires_in = ttl.num_seconds(), "User logged in");
        Ok(LoginOutcome {
            user,
            access_token,
            expires_in: ttl.num_seconds(),
            refresh_token,
        })
    }

    /// Mint a fresh access token from a live refresh token.
    ///
    /// The token's owner must still exist. With rotation on, the presented
    /// token is consumed before anything is minted.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome, AppError> {
        let user_id = self.refresh_tokens.resolve(refresh_token).await?;

        if self.users.find_by_id(user_id).await?.is_none() {
            tracing::warn!(user_id = %user_id, "Refresh token outlived its user");
            return Err(AuthError::UnknownUser.into());
        }

        let rotated = if self.policy.rotate_refresh_tokens {
            self.refresh_tokens.consume(refresh_token).await?;
            Some(self.refresh_tokens.issue(user_id).await?)
        } else {
            None
        };

        let ttl = Duration::seconds(ACCESS_TOKEN_MAX_TTL_SECS);
        let access_token = issue_access_token(user_id, &self.secret, ttl)?;

        tracing::info!(user_id = %user_id, rotated = rotated.is_some(), "Access token refreshed");
        Ok(RefreshOutcome {
            user_id,
            access_token,
            expires_in: ttl.num_seconds(),
            refresh_token: rotated,
        })
    }

    /// Revoke this one refresh token. Other tokens of the same user
    /// stay valid. Unknown tokens are accepted silently.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        match self.refresh_tokens.revoke(refresh_token).await {
            Err(AppError::Auth(AuthError::RefreshTokenNotFound)) => {
                tracing::debug!("Revoke called with unknown refresh token");
                Ok(())
            }
            other => other,
        }
    }

    /// Resolve an access token to its user id.
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AppError> {
        validate_access_token(access_token, &self.secret).map_err(|_| {
            tracing::warn!("Access token rejected");
            AuthError::AccessTokenRejected.into()
        })
    }

    /// Replace the email and password of an authenticated user.
    pub async fn change_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AppError> {
        let email = is_valid_email(email)?;
        validate_password_strength(password)?;
        let hashed = self
            .hasher
            .hash(password)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let user = self
            .users
            .update_credentials(user_id, &email, &hashed)
            .await
            .map_err(email_conflict)?
            .ok_or(AuthError::UnknownUser)?;

        tracing::info!(user_id = %user.id, "Credentials updated");
        Ok(user)
    }
}

fn email_conflict(err: DatabaseError) -> AppError {
    match err {
        DatabaseError::UniqueConstraintViolation(_) => {
            ValidationError::AlreadyRegistered("email".to_string()).into()
        }
        other => other.into(),
    }
}
