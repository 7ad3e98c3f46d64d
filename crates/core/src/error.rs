//! Error types for scopestore
//!
//! Two layers of errors exist:
//!
//! - [`BackendError`]: failures reported by the backing store capability
//!   (socket errors, closed connections, server error replies).
//! - [`StoreError`]: failures surfaced by the scope store facade. Whether a
//!   `StoreError` reaches the caller or is converted into a degraded fallback
//!   is decided by the store's health flag, not by the error itself.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for backend capability calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Result type alias for scope store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a backing store implementation
#[derive(Debug, Error)]
pub enum BackendError {
    /// Socket-level I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connection could not be established or was refused
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation attempted on a connection that is not open
    #[error("Connection closed")]
    Closed,

    /// Server replied with an error, or with a reply of the wrong type
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Reply bytes could not be framed; the stream is unusable
    #[error("Framing error: {0}")]
    Framing(String),
}

impl BackendError {
    /// Whether this error means the connection itself is gone.
    ///
    /// Connection loss, including a reply stream that lost its framing,
    /// flips the store into degraded mode. Protocol errors leave the health
    /// flag untouched and propagate to the caller.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            BackendError::Io(_)
                | BackendError::Connection(_)
                | BackendError::Closed
                | BackendError::Framing(_)
        )
    }
}

/// Errors surfaced by the scope store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation issued while the connection is not open
    #[error("Client not connected")]
    ClientNotConnected,

    /// Health flag is set: the backend is known to be unreachable
    #[error("Client marked as failed")]
    ClientFailed,

    /// Backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Graceful shutdown of the connection failed
    #[error("Close error: {0}")]
    Close(#[source] BackendError),

    /// Value could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timed out waiting for a connection state
    #[error("Timed out after {0}ms waiting for connection")]
    Timeout(u64),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl StoreError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        StoreError::Config(msg.into())
    }

    /// Whether this wraps a backend connection-loss error
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, StoreError::Backend(e) if e.is_connection_loss())
    }
}
