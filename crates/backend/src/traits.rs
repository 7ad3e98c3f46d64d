//! Backing store capability
//!
//! This module defines the `Backend` trait consumed by the scope store. It is
//! the smallest surface a flat, string-keyed store must offer: connection
//! lifecycle, single-key get/set, bulk deletion and glob enumeration.
//!
//! Implementations classify their failures through
//! [`BackendError::is_connection_loss`](scopestore_core::BackendError::is_connection_loss):
//! the store treats connection loss as an error event that moves it into
//! degraded mode, and everything else as a logical error for the caller.

use async_trait::async_trait;
use scopestore_core::BackendResult;

/// Flat string-keyed backing store
///
/// Thread safety: all methods may be called concurrently from multiple tasks
/// (requires Send + Sync). The implementation is responsible for serializing
/// or pipelining requests on its connection.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Establish the connection
    ///
    /// # Errors
    ///
    /// Returns a connection-loss error if the store is unreachable.
    async fn connect(&self) -> BackendResult<()>;

    /// Gracefully close the connection
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown handshake fails. The connection is
    /// released regardless.
    async fn disconnect(&self) -> BackendResult<()>;

    /// Whether the connection is currently open
    fn is_open(&self) -> bool;

    /// Get the text stored at `key`, `None` if absent
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Store `value` at `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Delete `keys`, returning how many existed
    async fn del(&self, keys: &[String]) -> BackendResult<u64>;

    /// Delete `keys` without blocking the server on reclamation
    ///
    /// Defaults to [`del`](Backend::del) for stores without lazy freeing.
    async fn unlink(&self, keys: &[String]) -> BackendResult<u64> {
        self.del(keys).await
    }

    /// All keys matching the glob `pattern`
    ///
    /// Pattern syntax follows Redis `KEYS`: `*`, `?`, `[...]` and `\` escapes.
    async fn keys(&self, pattern: &str) -> BackendResult<Vec<String>>;
}
