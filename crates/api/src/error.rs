//! HTTP Error Mapping
//!
//! Typed errors crossing the HTTP boundary. Validation failures become
//! 4xx responses with a descriptive message; storage failures become 500s
//! with the detail kept in the server log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::OrchestrateError;
use readings::ReadingError;
use serde_json::json;
use storage::StorageError;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Errors a route handler can surface
#[derive(Debug, Error)]
pub enum ApiError {
    /// Reading or feature value rejected before diagnosis
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Alert id does not match any retained alert
    #[error("alert {0} not found")]
    AlertNotFound(Uuid),

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ReadingError> for ApiError {
    fn from(err: ReadingError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<OrchestrateError> for ApiError {
    fn from(err: OrchestrateError) -> Self {
        match err {
            OrchestrateError::Storage(source) => ApiError::Storage(source),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::AlertNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("alert {id} not found"))
            }
            ApiError::Storage(source) => {
                error!("Storage failure serving request: {}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal storage error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
