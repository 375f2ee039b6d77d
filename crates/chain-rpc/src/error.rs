//! Error types for chain RPC operations.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`ChainRpcError`].
pub type Result<T> = std::result::Result<T, ChainRpcError>;

/// Errors that can occur while talking to a chain RPC endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChainRpcError {
    /// Failed to establish a connection to the endpoint.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Request timed out waiting for a response.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint URL does not carry a scheme this crate knows how to dial.
    #[error("unsupported endpoint scheme in {0}")]
    UnsupportedScheme(String),

    /// JSON-RPC error returned by the server.
    #[error("RPC error ({code}): {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the server.
        message: String,
    },

    /// Response was valid JSON but had an unexpected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Generic transport-level error wrapping the underlying library error.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ChainRpcError {
    /// Whether this failure is likely transient and worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Transport(_)
        )
    }
}

impl From<alloy::transports::TransportError> for ChainRpcError {
    fn from(err: alloy::transports::TransportError) -> Self {
        let msg = err.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") {
            Self::Connection(format!("request timed out: {msg}"))
        } else if lower.contains("connect") || lower.contains("refused") {
            Self::Connection(msg)
        } else {
            Self::Transport(msg)
        }
    }
}
