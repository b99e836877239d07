/// Error Handling Module
///
/// Two layers:
/// 1. `AppError` - rich internal errors, carrying the precise cause for logs
/// 2. `PublicError` - the narrow outcome that crosses the HTTP boundary
///
/// Every authentication cause (unknown email, wrong password, unknown, expired
/// or revoked refresh token, rejected access token) collapses into the same
/// `PublicError::Unauthorized`. Only `PublicError` is ever serialized.
/// Chirp lookups and ownership checks add `NotFound` and `Forbidden`.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for client-supplied input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
    AlreadyRegistered(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::AlreadyRegistered(field) => {
                write!(f, "{} is already registered", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// Persistence errors
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    ForeignKeyViolation(String),
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::ForeignKeyViolation(msg) => {
                write!(f, "Referenced row missing: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors. Fatal at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Authentication failures, with the precise cause kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    UnknownEmail,
    PasswordMismatch,
    AccessTokenRejected,
    UnknownUser,
    RefreshTokenNotFound,
    RefreshTokenExpired,
    RefreshTokenRevoked,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UnknownEmail => write!(f, "No user with that email"),
            AuthError::PasswordMismatch => write!(f, "Password does not match"),
            AuthError::AccessTokenRejected => write!(f, "Access token rejected"),
            AuthError::UnknownUser => write!(f, "Token subject no longer exists"),
            AuthError::RefreshTokenNotFound => write!(f, "Refresh token not found"),
            AuthError::RefreshTokenExpired => write!(f, "Refresh token has expired"),
            AuthError::RefreshTokenRevoked => write!(f, "Refresh token has been revoked"),
        }
    }
}

impl StdError for AuthError {}

/// Failures acting on a specific resource (a chirp) once the caller is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    NotFound(String),
    /// The caller is authenticated but does not own the resource.
    Forbidden(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound(what) => write!(f, "{} not found", what),
            ResourceError::Forbidden(what) => write!(f, "{} belongs to another user", what),
        }
    }
}

impl StdError for ResourceError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to.
/// Never serialized directly; see `PublicError`.
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Resource(ResourceError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Resource(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        AppError::Resource(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                DatabaseError::UniqueConstraintViolation(
                    db_err.constraint().unwrap_or("unique").to_string(),
                )
            }
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
                DatabaseError::ForeignKeyViolation(
                    db_err.constraint().unwrap_or("foreign key").to_string(),
                )
            }
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            sqlx::Error::Database(_) | sqlx::Error::ColumnDecode { .. } => {
                DatabaseError::QueryExecution(err.to_string())
            }
            _ => DatabaseError::UnexpectedError(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.into())
    }
}

// ============================================================================
// 3. PUBLIC BOUNDARY
// ============================================================================

/// The only outcomes a client can observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicError {
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest(String),
    InternalFailure,
}

impl PublicError {
    pub fn status(&self) -> StatusCode {
        match self {
            PublicError::Unauthorized => StatusCode::UNAUTHORIZED,
            PublicError::Forbidden => StatusCode::FORBIDDEN,
            PublicError::NotFound => StatusCode::NOT_FOUND,
            PublicError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PublicError::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PublicError::Unauthorized => "UNAUTHORIZED",
            PublicError::Forbidden => "FORBIDDEN",
            PublicError::NotFound => "NOT_FOUND",
            PublicError::BadRequest(_) => "BAD_REQUEST",
            PublicError::InternalFailure => "INTERNAL_ERROR",
        }
    }

    pub fn message(&self) -> String {
        match self {
            PublicError::Unauthorized => "Unauthorized".to_string(),
            PublicError::Forbidden => "Forbidden".to_string(),
            PublicError::NotFound => "Not found".to_string(),
            PublicError::BadRequest(msg) => msg.clone(),
            PublicError::InternalFailure => "Internal server error".to_string(),
        }
    }
}

impl From<&AppError> for PublicError {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Validation(e) => PublicError::BadRequest(e.to_string()),
            AppError::Auth(_) => PublicError::Unauthorized,
            AppError::Resource(ResourceError::NotFound(_)) => PublicError::NotFound,
            AppError::Resource(ResourceError::Forbidden(_)) => PublicError::Forbidden,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                PublicError::InternalFailure
            }
        }
    }
}

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Correlates the response with the server-side log line
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, public: &PublicError) -> Self {
        Self {
            error_id,
            message: public.message(),
            code: public.code().to_string(),
            status: public.status().as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    pub fn public(&self) -> PublicError {
        PublicError::from(self)
    }

    /// Log the internal cause. This is the only place the rich variant is written out.
    pub fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, cause = ?e, "Authentication failed");
            }
            AppError::Resource(e) => {
                tracing::info!(error_id = error_id, error = %e, "Resource request refused");
            }
            AppError::Database(e) => {
                tracing::error!(error_id = error_id, error = %e, "Database error");
            }
            AppError::Config(e) => {
                tracing::error!(error_id = error_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let public = self.public();
        HttpResponse::build(public.status()).json(ErrorResponse::new(error_id, &public))
    }

    fn status_code(&self) -> StatusCode {
        self.public().status()
    }
}
