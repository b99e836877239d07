/// Access Token Codec
///
/// Mints and validates HS256-signed JWTs. Validation failures of every kind
/// (bad signature, expired, wrong issuer, malformed, bad subject) come back as
/// the single `InvalidAccessToken`; the specific reason is only logged.

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::auth::secret::SigningSecret;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAccessToken;

impl fmt::Display for InvalidAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid access token")
    }
}

impl std::error::Error for InvalidAccessToken {}

/// Issue a signed access token for `user_id`, expiring `ttl` from now.
///
/// The codec takes `ttl` as given; bounding it is the caller's policy.
///
/// # Errors
/// Returns `AppError::Internal` if encoding fails
pub fn issue_access_token(
    user_id: Uuid,
    secret: &SigningSecret,
    ttl: Duration,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, ttl);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify signature, algorithm, issuer and expiry, and return the claims.
pub fn decode_claims(token: &str, secret: &SigningSecret) -> Result<Claims, InvalidAccessToken> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.expose()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Access token failed validation");
            InvalidAccessToken
        })?;

    // jsonwebtoken accepts exp == now; we require exp strictly in the future
    if claims.is_expired() {
        tracing::debug!("Access token expired");
        return Err(InvalidAccessToken);
    }

    Ok(claims)
}

/// Validate an access token and return the user it was issued to.
pub fn validate_access_token(
    token: &str,
    secret: &SigningSecret,
) -> Result<Uuid, InvalidAccessToken> {
    let claims = decode_claims(token, secret)?;
    claims.user_id().ok_or_else(|| {
        tracing::debug!("Access token subject is not a user id");
        InvalidAccessToken
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SigningSecret {
        SigningSecret::new("test-secret-key-at-least-32-characters-long").unwrap()
    }

    #[test]
    fn test_issue_and_validate_token() {
        let user_id = Uuid::new_v4();

        let token = issue_access_token(user_id, &secret(), Duration::seconds(3600))
            .expect("Failed to generate token");
        let validated = validate_access_token(&token, &secret()).expect("Failed to validate token");

        assert_eq!(validated, user_id);
    }

    #[test]
    fn test_claims_carry_issuer_and_lifetime() {
        let token = issue_access_token(Uuid::new_v4(), &secret(), Duration::seconds(120)).unwrap();
        let claims = decode_claims(&token, &secret()).unwrap();

        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.lifetime_seconds(), 120);
    }

    #[test]
    fn test_invalid_token() {
        assert_eq!(
            validate_access_token("invalid.token.here", &secret()),
            Err(InvalidAccessToken)
        );
        assert_eq!(validate_access_token("", &secret()), Err(InvalidAccessToken));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_access_token(Uuid::new_v4(), &secret(), Duration::seconds(3600)).unwrap();
        let other = SigningSecret::new("a-completely-different-signing-secret").unwrap();

        assert_eq!(validate_access_token(&token, &other), Err(InvalidAccessToken));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let token = issue_access_token(Uuid::new_v4(), &secret(), Duration::seconds(3600)).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let payload = &mut parts[1];
        let first = payload.remove(0);
        payload.insert(0, if first == 'e' { 'f' } else { 'e' });
        let tampered = parts.join(".");

        assert_eq!(validate_access_token(&tampered, &secret()), Err(InvalidAccessToken));
    }

    #[test]
    fn test_trailing_byte_is_rejected() {
        let token = issue_access_token(Uuid::new_v4(), &secret(), Duration::seconds(3600)).unwrap();
        let tampered = format!("{}X", token);

        assert!(validate_access_token(&tampered, &secret()).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = issue_access_token(Uuid::new_v4(), &secret(), Duration::seconds(-10)).unwrap();
        assert_eq!(validate_access_token(&token, &secret()), Err(InvalidAccessToken));
    }

    #[test]
    fn test_token_expires_after_ttl_elapses() {
        let token = issue_access_token(Uuid::new_v4(), &secret(), Duration::seconds(1)).unwrap();
        assert!(validate_access_token(&token, &secret()).is_ok());

        std::thread::sleep(std::time::Duration::from_millis(2100));
        assert_eq!(validate_access_token(&token, &secret()), Err(InvalidAccessToken));
    }

    #[test]
    fn test_unparsable_subject_is_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::seconds(60));
        claims.sub = "not-a-uuid".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret().expose()),
        )
        .unwrap();

        assert!(decode_claims(&token, &secret()).is_ok());
        assert_eq!(validate_access_token(&token, &secret()), Err(InvalidAccessToken));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::seconds(60));
        claims.iss = "someone-else".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret().expose()),
        )
        .unwrap();

        assert_eq!(validate_access_token(&token, &secret()), Err(InvalidAccessToken));
    }
}
