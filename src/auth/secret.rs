use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

/// Server-wide HMAC key for access tokens.
///
/// Built once at startup and shared read-only afterwards; clones share the
/// same bytes. `Debug` never prints the key.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    /// Fails with `ConfigError::MissingRequired` when the secret is empty or
    /// only whitespace.
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let bytes = bytes.as_ref();
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ConfigError::MissingRequired("auth.secret".to_string()));
        }
        Ok(Self(Arc::from(bytes)))
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}
