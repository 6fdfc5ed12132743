use axum::http::StatusCode;
use thiserror::Error;

/// Bearer token authorization errors.
///
/// Each variant maps to an HTTP status and a machine-readable code. The
/// human-readable message is for logs and never leaves the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is expected")]
    MissingAuthHeader,

    #[error("Invalid authorization header: {0}")]
    InvalidHeader(String),

    #[error("Unable to find the appropriate key: {0}")]
    SigningKeyNotFound(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Incorrect claims: {0}")]
    InvalidClaims(String),

    #[error("Permissions not included in token")]
    MissingPermissions,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Permission not found: {0}")]
    PermissionDenied(String),

    #[error("RSA key parsing error: {0}")]
    KeyParsingError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidHeader(_)
            | AuthError::TokenExpired
            | AuthError::InvalidClaims(_) => StatusCode::UNAUTHORIZED,
            AuthError::SigningKeyNotFound(_)
            | AuthError::MissingPermissions
            | AuthError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AuthError::KeyParsingError(_) | AuthError::ConfigurationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "authorization_header_missing",
            AuthError::InvalidHeader(_) | AuthError::SigningKeyNotFound(_) => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims(_) | AuthError::MissingPermissions => "invalid_claims",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::PermissionDenied(_) => "unauthorized",
            AuthError::KeyParsingError(_) | AuthError::ConfigurationError(_) => {
                "configuration_error"
            }
        }
    }

    /// True when the failure is on the server side rather than in the request.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}
