// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad login identifier or wrong password. Deliberately a single
    /// variant: callers must not be able to tell which one it was.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity already exists: {0}")]
    DuplicateIdentity(String),

    /// Malformed token or bad signature. Not recoverable; re-login.
    #[error("Invalid token")]
    TokenInvalid,

    /// Signature fine, expiry passed. Recoverable via renewal.
    #[error("Token expired")]
    TokenExpired,

    /// A superseded renewal token was presented. Treated as a security
    /// event, not a routine auth failure.
    #[error("Renewal token reuse detected")]
    TokenReuse,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenInvalid
            | AppError::TokenExpired
            | AppError::TokenReuse => StatusCode::UNAUTHORIZED,
            AppError::DuplicateIdentity(_) => StatusCode::CONFLICT,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "AUTH_001",
            AppError::AuthRateLimited => "AUTH_002",
            AppError::DuplicateIdentity(_) => "USER_001",
            AppError::TokenInvalid => "TOKEN_001",
            AppError::TokenExpired => "TOKEN_002",
            AppError::TokenReuse => "TOKEN_003",
            AppError::NotFound(_) => "NF_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => "Authentication failed".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::DuplicateIdentity(_) => {
                "Username or email already registered".to_string()
            },
            AppError::TokenInvalid => "Authentication failed".to_string(),
            AppError::TokenExpired => "Access token expired".to_string(),
            AppError::TokenReuse => {
                "Session no longer valid, please log in again".to_string()
            },
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::Io(_) => "Internal server error".to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        // Create a JSON response with error details
        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
