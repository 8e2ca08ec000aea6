//! Error types for the engine
//!
//! Provides unified error handling using thiserror.
//!
//! A cache miss is deliberately not represented here: `TieredCache::get`
//! returns an `Option` and the API reports `hit = false`, because a miss is
//! a normal outcome rather than a failure. The same goes for a suppressed
//! aggregation group, which is a valid result carrying an explicit marker.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Engine Error Enum ==
/// Unified error type for the cache and retention engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payload exceeds the namespace's configured size limit
    #[error("Value of {actual} bytes exceeds limit of {limit} bytes for namespace '{namespace}'")]
    OversizedValue {
        namespace: String,
        limit: usize,
        actual: usize,
    },

    /// Record category has no configured retention policy
    #[error("Unknown record category: {0}")]
    UnknownCategory(String),

    /// A retention cycle is already running
    #[error("Retention cycle already in progress")]
    CycleInProgress,

    /// External record store could not be reached
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::OversizedValue { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            EngineError::UnknownCategory(_) => StatusCode::BAD_REQUEST,
            EngineError::CycleInProgress => StatusCode::CONFLICT,
            EngineError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
