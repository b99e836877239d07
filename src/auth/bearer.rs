use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use std::fmt;

use crate::error::{AppError, ValidationError};

const BEARER_PREFIX: &str = "Bearer ";

/// The Authorization header was absent or not a usable `Bearer` credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingOrMalformed;

impl fmt::Display for MissingOrMalformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing or malformed bearer token")
    }
}

impl std::error::Error for MissingOrMalformed {}

impl From<MissingOrMalformed> for AppError {
    fn from(_: MissingOrMalformed) -> Self {
        AppError::Validation(ValidationError::InvalidFormat(
            "authorization header".to_string(),
        ))
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// The scheme is matched case-sensitively with exactly one space; the rest is
/// trimmed and must not be empty.
pub fn extract_bearer(header: Option<&str>) -> Result<String, MissingOrMalformed> {
    let token = header
        .ok_or(MissingOrMalformed)?
        .strip_prefix(BEARER_PREFIX)
        .ok_or(MissingOrMalformed)?
        .trim();

    if token.is_empty() {
        return Err(MissingOrMalformed);
    }
    Ok(token.to_string())
}

/// `extract_bearer` over a request's headers. Non-UTF-8 values are malformed.
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<String, MissingOrMalformed> {
    match headers.get(AUTHORIZATION) {
        None => extract_bearer(None),
        Some(value) => extract_bearer(Some(value.to_str().map_err(|_| MissingOrMalformed)?)),
    }
}
