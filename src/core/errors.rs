// src/core/errors.rs

//! Defines the primary error types for the relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// The main error enum, representing the failures that can surface from a request.
#[derive(Error, Debug)]
pub enum HostwatchError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// Host statistics could not be read from the operating system.
    #[error("System query failed: {0}")]
    SystemQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

/// A send to a single connection failed during a broadcast.
///
/// This never aborts the broadcast and never removes the connection; the
/// gateway's own close detection is responsible for that.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("delivery to connection {connection_id} ({addr}) failed: outbound queue closed")]
pub struct DeliveryError {
    pub connection_id: u64,
    pub addr: String,
}

impl HostwatchError {
    /// The HTTP status a route handler answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HostwatchError::InvalidRequest(_) | HostwatchError::Upload(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HostwatchError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

// --- From trait implementations for easy error conversion ---

impl From<serde_json::Error> for HostwatchError {
    fn from(e: serde_json::Error) -> Self {
        HostwatchError::InvalidRequest(format!("JSON deserialization error: {e}"))
    }
}

impl From<axum::extract::multipart::MultipartError> for HostwatchError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        HostwatchError::Upload(e.body_text())
    }
}

impl From<tokio::task::JoinError> for HostwatchError {
    fn from(e: tokio::task::JoinError) -> Self {
        HostwatchError::Internal(format!("blocking task failed: {e}"))
    }
}
