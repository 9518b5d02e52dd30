//! Error types for emberplus-server.

use thiserror::Error;

/// Main error type for all server operations.
#[derive(Debug, Error)]
pub enum EmberError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading a tree configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// BER decode error (malformed Ember+ payload).
    #[error("BER decode error: {0}")]
    Decode(String),

    /// Protocol error (malformed request, wrong element shape).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A matrix connect/disconnect/absolute request that fails validation.
    #[error("invalid matrix operation: {0}")]
    InvalidMatrixOperation(String),

    /// Outbound connect did not complete within the configured timeout.
    #[error("connect timed out")]
    ConnectTimeout,

    /// Connection closed while a send was pending.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using EmberError.
pub type Result<T> = std::result::Result<T, EmberError>;
