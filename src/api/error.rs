//! Error types for backend API calls.

use thiserror::Error;

/// Errors that can occur while talking to the booking backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body could not be parsed.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Backend rejected the request with an error body.
    #[error("{operation} rejected: {detail}")]
    Rejected {
        /// The operation the backend rejected.
        operation: &'static str,
        /// Rejection reason: the backend's `detail` field when present,
        /// otherwise the HTTP status line or the raw payload.
        detail: String,
    },
}
