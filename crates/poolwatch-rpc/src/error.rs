//! Transport-level error types.

use thiserror::Error;

use poolwatch_core::SyncError;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never got a response (connection refused, reset, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with a non-2xx status other than 429.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timed out after the configured duration.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Provider answered 429.
    #[error("rate limit exceeded (provider: {provider})")]
    RateLimited { provider: String },

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Response body was not valid JSON-RPC.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and worth retrying.
    /// Client errors (4xx) such as a rejected API key are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rpc(_) | TransportError::Deserialization(_) => {
                SyncError::Protocol(err.to_string())
            }
            other => SyncError::Transport(other.to_string()),
        }
    }
}
