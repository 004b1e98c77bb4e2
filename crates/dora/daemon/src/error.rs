//! Error types for the daemon.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dora_scorecard::ScorecardError;
use dora_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("server error: {0}")]
    Server(String),

    /// Storage error
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-handling errors, surfaced as HTTP 500 with a JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Internal(String),
}

impl From<ScorecardError> for ApiError {
    fn from(err: ScorecardError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_internal_server_error() {
        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
