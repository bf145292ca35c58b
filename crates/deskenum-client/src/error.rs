//! Error types for the request client.

use thiserror::Error;

/// Errors that can occur while talking to the target instance.
#[derive(Error, Debug)]
pub enum ClientError {
    /// DNS, connect, TLS, timeout or body-read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered with a status of 500 or above
    #[error("server error: {status}")]
    ServerStatus {
        /// HTTP status code
        status: u16,
    },

    /// Every attempt failed with a retryable error
    #[error("max retries exceeded after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Total attempts made (first try plus retries)
        attempts: u32,
        /// The last failure observed
        source: Box<ClientError>,
    },

    /// Non-success status below 500, surfaced when decoding
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Leading part of the response body
        body: String,
    },

    /// Response body was not the expected JSON shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Request body could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backoff wait was interrupted by cancellation
    #[error("request cancelled")]
    Cancelled,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Whether the retry loop should try again after this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ServerStatus { .. })
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
