use std::fmt;

use axum::{http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CtxError {
    pub error: AppError,
    pub req_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    Generic { description: String },
    AuthFailNoUserId,
    UserNotFound { user_id: String },
    FairytaleNotFound { fairytale_id: String },
    LikeAlreadyExists { user_id: String, fairytale_id: String },
    LikeNotFound { user_id: String, fairytale_id: String },
    LockTimeout { key: String },
    StorageFailure { source: String },
    LockServiceUnavailable { source: String },
}

/// Error carrying the request id reported to the client; implements IntoResponse.
pub type CtxResult<T> = core::result::Result<T, CtxError>;
/// Any error produced below the HTTP layer.
pub type AppResult<T> = core::result::Result<T, AppError>;

impl std::error::Error for AppError {}

impl AppError {
    /// Stable machine readable code, one per kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Generic { .. } => "GENERIC",
            Self::AuthFailNoUserId => "UNAUTHENTICATED",
            Self::UserNotFound { .. } => "USER_NOT_FOUND",
            Self::FairytaleNotFound { .. } => "FAIRYTALE_NOT_FOUND",
            Self::LikeAlreadyExists { .. } => "LIKE_ALREADY_EXISTS",
            Self::LikeNotFound { .. } => "LIKE_NOT_FOUND",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::StorageFailure { .. } => "STORAGE_FAILURE",
            Self::LockServiceUnavailable { .. } => "LOCK_SERVICE_UNAVAILABLE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UserNotFound { .. }
            | AppError::FairytaleNotFound { .. }
            | AppError::LikeNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::LikeAlreadyExists { .. } => StatusCode::CONFLICT,
            AppError::LockTimeout { .. } => StatusCode::LOCKED,
            AppError::AuthFailNoUserId => StatusCode::UNAUTHORIZED,
            AppError::Generic { .. } => StatusCode::BAD_REQUEST,
            AppError::StorageFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::LockServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl CtxError {
    pub fn new(error: AppError) -> Self {
        CtxError {
            error,
            req_id: Uuid::new_v4(),
        }
    }
}

impl From<AppError> for CtxError {
    fn from(value: AppError) -> Self {
        CtxError::new(value)
    }
}

impl From<CtxError> for AppError {
    fn from(value: CtxError) -> Self {
        value.error
    }
}

const INTERNAL: &str = "Internal error";

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic { description } => write!(f, "{description}"),
            Self::AuthFailNoUserId => write!(f, "You are not logged in"),
            Self::UserNotFound { user_id } => write!(f, "User {user_id} not found"),
            Self::FairytaleNotFound { fairytale_id } => {
                write!(f, "Fairytale {fairytale_id} not found")
            }
            Self::LikeAlreadyExists { fairytale_id, .. } => {
                write!(f, "Fairytale {fairytale_id} is already liked")
            }
            Self::LikeNotFound { fairytale_id, .. } => {
                write!(f, "Fairytale {fairytale_id} is not liked")
            }
            Self::LockTimeout { .. } => write!(f, "Could not acquire the lock, try again"),
            Self::StorageFailure { .. } => write!(f, "{INTERNAL}"),
            Self::LockServiceUnavailable { .. } => write!(f, "Lock service unavailable"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponseBody {
    pub error: String,
    pub code: String,
    pub req_id: String,
}

impl ErrorResponseBody {
    pub fn new(error: &AppError, req_id: &Uuid) -> Self {
        ErrorResponseBody {
            error: error.to_string(),
            code: error.code().to_string(),
            req_id: req_id.to_string(),
        }
    }
}

// REST error response
impl IntoResponse for CtxError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.error.status_code();
        if status_code.is_server_error() {
            error!(req_id = %self.req_id, error = ?self.error, "request failed");
        } else {
            warn!(req_id = %self.req_id, code = self.error.code(), "request rejected");
        }
        let body = ErrorResponseBody::new(&self.error, &self.req_id);
        let mut response = (status_code, axum::Json(body)).into_response();
        // Insert the real Error into the response - for the logger
        response.extensions_mut().insert(self.error);
        response
    }
}

// External Errors
impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Generic {
            description: value.to_string(),
        }
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(value: surrealdb::Error) -> Self {
        Self::StorageFailure {
            source: value.to_string(),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(value: redis::RedisError) -> Self {
        Self::LockServiceUnavailable {
            source: value.to_string(),
        }
    }
}
