/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt embedded in the output. Strength rules
/// are checked separately by `validate_password_strength` so that hashing never
/// fails because of what the password contains.

use bcrypt::{hash, verify, DEFAULT_COST};
use std::fmt;

use crate::error::ValidationError;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hashing could not run (bad cost parameter or entropy source failure).
#[derive(Debug)]
pub struct HashingFailure(String);

impl fmt::Display for HashingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password hashing failed: {}", self.0)
    }
}

impl std::error::Error for HashingFailure {}

/// Outcome of a password check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch,
}

const DECOY_CREDENTIAL: &str = "chirpy-decoy-credential";

pub struct CredentialHasher {
    cost: u32,
    /// Hash at the same cost as real credentials, built once up front.
    decoy: Option<String>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        let decoy = match hash(DECOY_CREDENTIAL, cost) {
            Ok(decoy) => Some(decoy),
            Err(e) => {
                tracing::error!(
                    cost = cost,
                    error = %e,
                    "Could not build decoy hash; unknown-email logins will return early"
                );
                None
            }
        };

        Self { cost, decoy }
    }

    /// Hash a password. Two calls with the same input produce different strings.
    pub fn hash(&self, password: &str) -> Result<String, HashingFailure> {
        hash(password, self.cost).map_err(|e| HashingFailure(e.to_string()))
    }

    /// Check `password` against a stored hash.
    ///
    /// A malformed stored hash is reported as `Mismatch`, same as a wrong password.
    pub fn verify(&self, password: &str, stored: &str) -> Verification {
        match verify(password, stored) {
            Ok(true) => Verification::Match,
            Ok(false) => Verification::Mismatch,
            Err(_) => {
                tracing::debug!("Stored credential could not be parsed");
                Verification::Mismatch
            }
        }
    }

    /// Burn the same work as a real check, for callers that have no stored hash.
    /// Always returns `Mismatch`.
    pub fn verify_decoy(&self, password: &str) -> Verification {
        if let Some(decoy) = &self.decoy {
            let _ = self.verify(password, decoy);
        }
        Verification::Mismatch
    }
}

/// Validate password strength requirements
///
/// Requirements:
/// - Minimum 8 characters
/// - Maximum 128 characters
/// - At least one digit
/// - At least one lowercase letter
/// - At least one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat("password".to_string()));
    }

    Ok(())
}
