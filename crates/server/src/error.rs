// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inferbox_core::RecognizeError;
use serde::Serialize;
use thiserror::Error;

use crate::jobs::{CancelError, JobId};

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job {id} is still {status}")]
    JobNotFinished { id: JobId, status: &'static str },

    #[error("Job {id} {status}: {reason}")]
    JobFailed {
        id: JobId,
        status: &'static str,
        reason: String,
    },

    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognizeError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CancelError> for ApiError {
    fn from(err: CancelError) -> Self {
        match err {
            CancelError::NotFound(id) => ApiError::JobNotFound(id),
            e @ CancelError::AlreadyFinished { .. } => ApiError::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::JobNotFound(id) => {
                tracing::warn!(job_id = id, "Job not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Job not found", format!("Job ID: {}", id)),
                )
            }
            ApiError::JobNotFinished { id, status } => {
                tracing::debug!(job_id = id, status, "Job not finished");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::with_details("Job not finished", format!("Job {id} is {status}")),
                )
            }
            ApiError::JobFailed { id, status, reason } => {
                tracing::debug!(job_id = id, status, "Job has no result");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse::with_details(format!("Job {status}"), reason.clone()),
                )
            }
            ApiError::Recognition(err) => {
                let (status, error_msg) = match err {
                    RecognizeError::InvalidOptions(msg) => {
                        tracing::warn!(message = %msg, "Invalid recognize options");
                        (StatusCode::BAD_REQUEST, "Invalid recognize options")
                    }
                    RecognizeError::MissingImage(path) => {
                        tracing::error!(path = %path, "Staged image missing");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Staged image missing")
                    }
                    RecognizeError::SpawnFailed(msg) => {
                        tracing::error!(error = %msg, "Recognizer could not be started");
                        (StatusCode::BAD_GATEWAY, "Recognizer unavailable")
                    }
                    RecognizeError::CliError(msg) => {
                        tracing::error!(error = %msg, "Recognizer failed");
                        (StatusCode::BAD_GATEWAY, "Recognizer failed")
                    }
                    RecognizeError::Timeout(secs) => {
                        tracing::error!(timeout_secs = secs, "Recognizer timed out");
                        (StatusCode::GATEWAY_TIMEOUT, "Recognizer timed out")
                    }
                };
                (status, ErrorResponse::with_details(error_msg, err.to_string()))
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::PayloadTooLarge(msg) => {
                tracing::warn!(message = %msg, "Payload too large");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    ErrorResponse::with_details("Payload too large", msg.clone()),
                )
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(message = %msg, "Conflict");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::with_details("Conflict", msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
