//! Shared helpers for the scope store suite.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

pub use scopestore::{
    Ack, ActiveSet, ConnectionState, Fault, MemoryBackend, ReconnectPolicy, Reply, ScopeStore,
    StoreConfig, StoreError, Value,
};
pub use serde_json::json;

pub const PREFIX: &str = "noderedtest:";
pub const WAIT: Duration = Duration::from_secs(3);

/// Install a test-writer tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Config with short reconnect delays so tests do not wait on backoff
pub fn fast_config() -> StoreConfig {
    StoreConfig {
        reconnect: ReconnectPolicy {
            step_ms: 5,
            max_delay_ms: 25,
        },
        ..StoreConfig::with_prefix(PREFIX)
    }
}

/// Opened store over a fresh memory backend, already `Ready`
pub async fn ready_store() -> (Arc<ScopeStore>, Arc<MemoryBackend>) {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(ScopeStore::new(&fast_config(), backend.clone()));
    store.open().await;
    store.wait_ready(WAIT).await.unwrap();
    (store, backend)
}

/// Cut the backend off and wait until the store reports `Failed`.
pub async fn degrade(store: &ScopeStore, backend: &MemoryBackend) {
    backend.set_reachable(false);
    // Any operation surfaces the closed handle as an error event.
    let _ = store.get("probe", "probe").await;
    store
        .connection()
        .wait_for(ConnectionState::Failed, WAIT)
        .await
        .unwrap();
    assert!(store.is_failed());
}

/// Sorted keys of `scope`
pub async fn sorted_keys(store: &ScopeStore, scope: &str) -> Vec<String> {
    let mut keys = store.keys(scope).await.unwrap();
    keys.sort();
    keys
}
