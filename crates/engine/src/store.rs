//! ScopeStore: scoped key-value facade
//!
//! ## Design
//!
//! ScopeStore composes the key codec with backend calls. It holds the key
//! prefix and the [`Connection`]; all data lives in the backing store.
//!
//! ## Degraded mode
//!
//! Every operation runs through one guard:
//!
//! 1. Health check (`Connection::check`).
//! 2. The backend call.
//! 3. On error: connection-loss errors are reported as an error event first.
//!    Then, if the health flag is set, the error is swallowed and the
//!    operation's fallback is returned; otherwise it propagates.
//!
//! | Operation | Fallback when degraded |
//! |-----------|------------------------|
//! | `get`     | `Reply::Disconnected`  |
//! | `set`     | `Reply::Disconnected`  |
//! | `delete`  | `()`                   |
//! | `keys`    | empty `Vec`            |
//! | `clean`   | `()`                   |
//!
//! ## Concurrency
//!
//! No locking across operations: concurrent writes to one key are
//! last-write-wins at the backend, and `clean` may remove a key written
//! moments earlier.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scopestore_backend::Backend;
use scopestore_core::codec::{self, global_pattern, physical_key, scope_pattern};
use scopestore_core::scope::plan_cleanup;
use scopestore_core::{Ack, ActiveSet, Reply, StoreError, StoreResult, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::connection::{Connection, ConnectionState};

/// Outcome of a guarded operation before the fallback policy is applied
#[derive(Debug)]
enum Guarded<T> {
    /// The backend answered
    Ok(T),
    /// Failed while the backend is known down; the caller gets a fallback
    Degraded(StoreError),
    /// Genuine error for the caller
    Err(StoreError),
}

impl<T> Guarded<T> {
    fn or_fallback(self, op: &'static str, fallback: impl FnOnce() -> T) -> StoreResult<T> {
        match self {
            Guarded::Ok(value) => Ok(value),
            Guarded::Degraded(e) => {
                debug!(
                    target: "scopestore::store",
                    op,
                    error = %e,
                    "Backend down, returning fallback"
                );
                Ok(fallback())
            }
            Guarded::Err(e) => Err(e),
        }
    }
}

/// Scoped key-value store over a shared backend
///
/// # Example
///
/// ```ignore
/// let store = ScopeStore::new(&StoreConfig::default(), Arc::new(MemoryBackend::new()));
/// store.open().await;
/// store.wait_ready(Duration::from_secs(3)).await?;
///
/// store.set("flow:node", "count", json!(1)).await?;
/// let count = store.get("flow:node", "count").await?;
/// store.clean(["flow", "node"]).await?;
/// ```
#[derive(Debug)]
pub struct ScopeStore {
    prefix: String,
    connection: Connection,
}

impl ScopeStore {
    /// Create a store using `config`'s prefix and reconnection policy
    pub fn new(config: &StoreConfig, backend: Arc<dyn Backend>) -> Self {
        Self {
            prefix: config.prefix.clone(),
            connection: Connection::new(backend, config.reconnect),
        }
    }

    /// Create a store with the given prefix and default reconnection policy
    pub fn with_prefix(prefix: impl Into<String>, backend: Arc<dyn Backend>) -> Self {
        Self::new(&StoreConfig::with_prefix(prefix), backend)
    }

    /// Prefix shared by every physical key this store writes
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The connection lifecycle
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Health flag
    pub fn is_failed(&self) -> bool {
        self.connection.is_failed()
    }

    /// Receiver observing connection state transitions
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Start connecting in the background; never fails
    pub async fn open(&self) {
        self.connection.open().await;
    }

    /// Wait until the connection is ready
    pub async fn wait_ready(&self, timeout: Duration) -> StoreResult<()> {
        self.connection.wait_for(ConnectionState::Ready, timeout).await
    }

    /// Close the connection, surfacing shutdown errors
    pub async fn close(&self) -> StoreResult<()> {
        self.connection.close().await
    }

    fn backend(&self) -> &dyn Backend {
        self.connection.backend().as_ref()
    }

    async fn guard<T, F>(&self, op: &'static str, operation: F) -> Guarded<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let result = match self.connection.check() {
            Ok(()) => operation.await,
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => Guarded::Ok(value),
            Err(e) => {
                if let StoreError::Backend(backend_err) = &e {
                    if backend_err.is_connection_loss() {
                        self.connection.report_failure(backend_err);
                    }
                }
                if self.connection.is_failed() {
                    Guarded::Degraded(e)
                } else {
                    debug!(target: "scopestore::store", op, error = %e, "Operation failed");
                    Guarded::Err(e)
                }
            }
        }
    }

    /// Get the value of `key` in `scope`.
    ///
    /// Returns `Reply::Value(None)` if the key does not exist or holds
    /// `null`, and `Reply::Disconnected` if the backend is down. Stored text that is not
    /// JSON comes back as a string.
    pub async fn get(&self, scope: &str, key: &str) -> StoreResult<Reply<Option<Value>>> {
        let physical = physical_key(&self.prefix, scope, key);
        self.guard("get", async {
            let raw = self.backend().get(&physical).await?;
            let value = raw
                .map(|text| codec::decode_value(Some(text.as_str())))
                .filter(|value| !value.is_null());
            Ok::<_, StoreError>(Reply::Value(value))
        })
        .await
        .or_fallback("get", || Reply::Disconnected)
    }

    /// Set `key` in `scope` to `value`; a `null` value deletes the key.
    pub async fn set(
        &self,
        scope: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> StoreResult<Reply<Ack>> {
        let physical = physical_key(&self.prefix, scope, key);
        let value = value.into();
        self.guard("set", async {
            match codec::encode_value(&value)? {
                None => {
                    let removed = self.backend().del(&[physical.clone()]).await?;
                    Ok::<_, StoreError>(Reply::Value(Ack::Removed(removed)))
                }
                Some(text) => {
                    self.backend().set(&physical, &text).await?;
                    Ok(Reply::Value(Ack::Stored))
                }
            }
        })
        .await
        .or_fallback("set", || Reply::Disconnected)
    }

    /// Delete every key in `scope`. Deleting an empty scope is a no-op.
    pub async fn delete(&self, scope: &str) -> StoreResult<()> {
        let pattern = scope_pattern(&self.prefix, scope);
        self.guard("delete", async {
            let found = self.backend().keys(&pattern).await?;
            if !found.is_empty() {
                let removed = self.backend().unlink(&found).await?;
                debug!(target: "scopestore::store", scope, removed, "Deleted scope");
            }
            Ok::<_, StoreError>(())
        })
        .await
        .or_fallback("delete", || ())
    }

    /// Bare keys stored in `scope`, in backend order.
    pub async fn keys(&self, scope: &str) -> StoreResult<Vec<String>> {
        let pattern = scope_pattern(&self.prefix, scope);
        self.guard("keys", async {
            let found = self.backend().keys(&pattern).await?;
            let bare: Vec<String> = found
                .iter()
                .filter_map(|physical| codec::strip_scope(&self.prefix, scope, physical))
                .map(str::to_string)
                .collect();
            Ok::<_, StoreError>(bare)
        })
        .await
        .or_fallback("keys", Vec::new)
    }

    /// Remove keys whose scope hierarchy has a segment outside `active`.
    ///
    /// `"global"` is always active. Keys with no `:` after the prefix are
    /// never removed, and the last `:`-separated part of a key is never
    /// checked. See [`scopestore_core::scope`] for the full rule.
    pub async fn clean(&self, active: impl Into<ActiveSet>) -> StoreResult<()> {
        let active = active.into();
        let pattern = global_pattern(&self.prefix);
        self.guard("clean", async {
            let all = self.backend().keys(&pattern).await?;
            if all.is_empty() {
                return Ok::<_, StoreError>(());
            }
            let stale: Vec<String> = plan_cleanup(&self.prefix, &all, &active)
                .into_iter()
                .map(str::to_string)
                .collect();
            if !stale.is_empty() {
                self.backend().del(&stale).await?;
                warn!(
                    target: "scopestore::store",
                    count = stale.len(),
                    "Cleaned {} keys for inactive scopes",
                    stale.len()
                );
            }
            Ok::<_, StoreError>(())
        })
        .await
        .or_fallback("clean", || ())
    }
}
