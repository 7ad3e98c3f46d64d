//! scopestore - Scoped, failure-tolerant key-value facade
//!
//! scopestore maps `(scope, key)` pairs onto a shared Redis-compatible
//! store, keeps a supervised connection with automatic reconnection, and
//! degrades to default results instead of errors while the backend is down.
//!
//! # Quick Start
//!
//! ```ignore
//! use scopestore::{connect, StoreConfig, Reply};
//!
//! let store = scopestore::connect(StoreConfig::default()).await?;
//! store.wait_ready(Duration::from_secs(3)).await?;
//!
//! store.set("flow1:node1", "count", 1).await?;
//! if let Reply::Value(Some(count)) = store.get("flow1:node1", "count").await? {
//!     println!("count = {}", count);
//! }
//!
//! // Drop everything not belonging to live flows/nodes
//! store.clean(["flow1", "node1"]).await?;
//! store.close().await?;
//! ```
//!
//! # Architecture
//!
//! - `scopestore-core`: key codec, cleanup rule, reply types, errors
//! - `scopestore-backend`: the `Backend` capability, in-memory and RESP backends
//! - `scopestore-engine`: configuration, connection lifecycle, `ScopeStore`

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::Arc;

pub use scopestore_backend::{glob, Backend, Fault, MemoryBackend, RespBackend, RespOptions};
pub use scopestore_core::{
    codec, scope, Ack, ActiveSet, BackendError, BackendResult, Reply, StoreError, StoreResult,
    Value, DISCONNECTED_FLAG, GLOBAL_SCOPE,
};
pub use scopestore_engine::{
    Connection, ConnectionState, ReconnectPolicy, ScopeStore, StoreConfig, CONFIG_FILE_NAME,
    DEFAULT_PREFIX,
};

/// Build a store over a RESP backend described by `config` and start connecting.
///
/// Returns as soon as the background connection task is running; use
/// [`ScopeStore::wait_ready`] to block until the server answers.
///
/// # Errors
///
/// Returns `StoreError::Config` if `config` fails validation.
pub async fn connect(config: StoreConfig) -> StoreResult<ScopeStore> {
    config.validate()?;
    let backend = Arc::new(RespBackend::new(config.resp_options()));
    let store = ScopeStore::new(&config, backend);
    store.open().await;
    tracing::debug!(
        target: "scopestore::conn",
        address = %config.address(),
        prefix = %config.prefix,
        "Store created"
    );
    Ok(store)
}
