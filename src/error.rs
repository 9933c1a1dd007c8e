//! Error types for the worker gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

// == Worker Error Enum ==
/// Unified error type for the dispatcher, lifecycle manager and proxy.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Connectivity failure (DNS, refused connection, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The cache storage backend failed
    #[error("Cache storage error: {0}")]
    Storage(String),

    /// Invalid request data
    #[error("{0}")]
    InvalidRequest(String),

    /// HTTP method not accepted by the endpoint
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A required server credential is missing
    #[error("{0} not configured")]
    NotConfigured(String),

    /// The gateway received a request it forwarded itself
    #[error("Forwarding loop: the network origin points back at this gateway")]
    ForwardingLoop,

    /// Upstream API answered with a non-success status
    #[error("Notion API error")]
    Upstream { status: StatusCode, details: Value },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            WorkerError::Network(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            WorkerError::Storage(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
            WorkerError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            WorkerError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            WorkerError::ForwardingLoop => {
                (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() }))
            }
            WorkerError::NotConfigured(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
            WorkerError::Upstream { status, details } => (
                *status,
                json!({
                    "error": "Notion API error",
                    "details": details,
                    "status": status.as_u16(),
                }),
            ),
            WorkerError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Internal server error",
                    "message": msg,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for WorkerError {
    fn from(err: reqwest::Error) -> Self {
        WorkerError::Network(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the worker gateway.
pub type Result<T> = std::result::Result<T, WorkerError>;
