use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::error;
use validator::ValidationError;

use crate::{dao::storage::StorageError, dto::error::ErrorBody};

const UNAVAILABLE_TEXT: &str = "Service temporarily unavailable";
const INTERNAL_TEXT: &str = "Something went wrong";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed while serving the request.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing or rejected credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The write clashes with existing data.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Unexpected failure outside storage, e.g. a panicked blocking task.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        let message = err
            .message
            .map(|message| message.into_owned())
            .unwrap_or_else(|| err.code.into_owned());
        ServiceError::InvalidInput(message)
    }
}

/// Application-level errors that are converted to HTTP responses.
///
/// The display text of client errors is sent verbatim in the `error` field.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or invalid input (400).
    #[error("{0}")]
    BadRequest(String),
    /// Missing, expired or rejected credentials (401).
    #[error("{0}")]
    Unauthorized(String),
    /// Write refused by a uniqueness rule (409).
    #[error("{0}")]
    Conflict(String),
    /// Detail is logged, never returned.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, text) = match &self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.as_str()),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.as_str()),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message.as_str()),
            AppError::ServiceUnavailable(detail) => {
                error!(%detail, "request failed: storage unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_TEXT)
            }
            AppError::Internal(detail) => {
                error!(%detail, "request failed: internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_TEXT)
            }
        };

        (status, Json(ErrorBody::new(text))).into_response()
    }
}
