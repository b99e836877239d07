/// Authentication module
///
/// Password hashing, access token issue/validation, refresh token lifecycle,
/// bearer header parsing, and the session flows that tie them together.

mod bearer;
mod claims;
mod extractor;
mod jwt;
mod password;
mod refresh_token;
mod secret;
mod session;

pub use bearer::{bearer_from_headers, extract_bearer, MissingOrMalformed};
pub use claims::{Claims, ISSUER};
pub use extractor::AuthenticatedUser;
pub use jwt::{decode_claims, issue_access_token, validate_access_token, InvalidAccessToken};
pub use password::{
    validate_password_strength, CredentialHasher, HashingFailure, Verification,
};
pub use refresh_token::{
    generate_refresh_token, token_fingerprint, RefreshTokenStore, REFRESH_TOKEN_LIFETIME_DAYS,
};
pub use secret::SigningSecret;
pub use session::{
    clamp_access_ttl, LoginOutcome, RefreshOutcome, SessionPolicy, SessionService,
    ACCESS_TOKEN_MAX_TTL_SECS,
};
