//! API error types.
//!
//! Every failure a handler can produce maps onto one of six client-facing
//! categories. Conflicts surface as 400, not 409; that status is part of the
//! published contract.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use jobdesk_firestore::FirestoreError;

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error")]
    Store(#[source] FirestoreError),
}

/// API result type alias.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FirestoreError> for ApiError {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::AlreadyExists(_) => Self::conflict("value already in use"),
            FirestoreError::NotFound(_) => Self::not_found("record no longer exists"),
            FirestoreError::PreconditionFailed(_) => {
                Self::conflict("record changed concurrently, retry")
            }
            other => Self::Store(other),
        }
    }
}

/// Map a unique-key reservation failure to a Conflict with a caller-facing
/// detail; anything else keeps its store-level classification.
pub fn conflict_if_exists(err: FirestoreError, detail: &str) -> ApiError {
    if err.is_already_exists() {
        ApiError::conflict(detail)
    } else {
        err.into()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    detail: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (detail, code) = match &self {
            Self::Validation(d) => (d.clone(), "VALIDATION_ERROR"),
            Self::Conflict(d) => (d.clone(), "CONFLICT"),
            Self::Unauthorized(d) => (d.clone(), "UNAUTHORIZED"),
            Self::Forbidden(d) => (d.clone(), "FORBIDDEN"),
            Self::NotFound(d) => (d.clone(), "NOT_FOUND"),
            // Internals are never echoed to clients, whatever the environment.
            Self::Internal(_) | Self::Store(_) => {
                error!(error = ?self, "Request failed with internal error");
                ("Internal server error".to_string(), "SERVER_ERROR")
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                detail,
                code: code.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================
