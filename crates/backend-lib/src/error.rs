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
    #[error("User already exists")]
    DuplicateUser,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Acting user is not an admin")]
    Unauthorized,

    #[error("Target user not found")]
    NotFound,

    #[error("Admins cannot perform this action on themselves")]
    SelfActionForbidden,

    #[error("Session expired")]
    SessionExpired,

    #[error("Malformed session timestamp: {0}")]
    MalformedSessionTimestamp(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::InvalidCredentials
            | AppError::Unauthenticated
            | AppError::SessionExpired
            | AppError::MalformedSessionTimestamp(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized | AppError::NotFound | AppError::SelfActionForbidden => {
                StatusCode::FORBIDDEN
            },
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_)
            | AppError::Crypto(_)
            | AppError::Io(_)
            | AppError::Json(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::DuplicateUser => "USER_001",
            AppError::InvalidCredentials => "AUTH_001",
            AppError::Unauthenticated => "AUTH_002",
            // Expired and malformed sessions are indistinguishable to the caller
            AppError::SessionExpired | AppError::MalformedSessionTimestamp(_) => "SESSION_001",
            // Admin precondition failures share one code
            AppError::Unauthorized | AppError::NotFound | AppError::SelfActionForbidden => {
                "ADMIN_001"
            },
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Storage(_) => "STORE_001",
            AppError::Crypto(_) => "INT_002",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for returning to the caller
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::DuplicateUser => "Username is not available".to_string(),
            AppError::InvalidCredentials => "Invalid username or password".to_string(),
            AppError::Unauthenticated => "Please log in".to_string(),
            AppError::SessionExpired | AppError::MalformedSessionTimestamp(_) => {
                "Session expired, please log in again".to_string()
            },
            AppError::Unauthorized | AppError::NotFound | AppError::SelfActionForbidden => {
                "Action not permitted".to_string()
            },
            AppError::InvalidInput(msg) => format!("Invalid input: {msg}"),
            AppError::Storage(_)
            | AppError::Crypto(_)
            | AppError::Io(_)
            | AppError::Json(_)
            | AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Whether this error means the session must be discarded
    pub fn clears_session(&self) -> bool {
        matches!(
            self,
            AppError::SessionExpired | AppError::MalformedSessionTimestamp(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "request rejected");
        }

        // Detail stays in the logs; the body only carries the sanitized text
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.sanitized_message(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
