//! Connection lifecycle observed through the public store API

use std::sync::Arc;
use std::time::Duration;

use crate::common::*;
use scopestore::CONFIG_FILE_NAME;
use tempfile::TempDir;

/// Address nothing listens on
async fn dead_address() -> (String, u16) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    ("127.0.0.1".to_string(), port)
}

#[tokio::test]
async fn new_store_is_unopened() {
    init_tracing();
    let store = ScopeStore::new(&fast_config(), Arc::new(MemoryBackend::new()));
    assert_eq!(store.state(), ConnectionState::Unopened);
    assert!(matches!(
        store.set("context", "k", 1).await.unwrap_err(),
        StoreError::ClientNotConnected
    ));
}

#[tokio::test]
async fn subscribers_see_ready() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let store = ScopeStore::new(&fast_config(), backend);
    let mut rx = store.subscribe();
    store.open().await;
    let state = *rx
        .wait_for(|s| *s == ConnectionState::Ready)
        .await
        .unwrap();
    assert_eq!(state, ConnectionState::Ready);
}

#[tokio::test]
async fn unreachable_at_start_then_recovers() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    backend.set_reachable(false);
    let store = ScopeStore::new(&fast_config(), backend.clone());

    store.open().await;
    store
        .connection()
        .wait_for(ConnectionState::Failed, WAIT)
        .await
        .unwrap();
    assert_eq!(store.get("context", "k").await.unwrap(), Reply::Disconnected);

    backend.set_reachable(true);
    store.wait_ready(WAIT).await.unwrap();
    assert_eq!(store.get("context", "k").await.unwrap(), Reply::Value(None));
    assert!(backend.connect_attempts() >= 2);
}

#[tokio::test]
async fn close_is_terminal() {
    let (store, _) = ready_store().await;
    store.close().await.unwrap();
    assert_eq!(store.state(), ConnectionState::Closed);

    store.open().await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(store.state(), ConnectionState::Closed);
    assert!(matches!(
        store.get("context", "k").await.unwrap_err(),
        StoreError::ClientNotConnected
    ));
}

#[tokio::test]
async fn close_surfaces_disconnect_error() {
    let (store, backend) = ready_store().await;
    backend.set_disconnect_fails(true);
    let err = store.close().await.unwrap_err();
    assert!(matches!(err, StoreError::Close(_)));
    assert_eq!(store.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn close_unopened_store_is_ok() {
    init_tracing();
    let store = ScopeStore::new(&fast_config(), Arc::new(MemoryBackend::new()));
    store.close().await.unwrap();
    assert_eq!(store.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn wait_ready_times_out_while_unreachable() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    backend.set_reachable(false);
    let store = ScopeStore::new(&fast_config(), backend);
    store.open().await;
    let err = store.wait_ready(Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout(50)));
}

#[tokio::test]
async fn connect_rejects_invalid_config() {
    let config = StoreConfig {
        port: 0,
        ..StoreConfig::default()
    };
    assert!(matches!(
        scopestore::connect(config).await.unwrap_err(),
        StoreError::Config(_)
    ));
}

#[tokio::test]
async fn connect_to_dead_server_degrades() {
    init_tracing();
    let (host, port) = dead_address().await;
    let config = StoreConfig {
        host,
        port,
        ..fast_config()
    };
    let store = scopestore::connect(config).await.unwrap();
    store
        .connection()
        .wait_for(ConnectionState::Failed, WAIT)
        .await
        .unwrap();

    assert_eq!(store.get("context", "k").await.unwrap(), Reply::Disconnected);
    assert!(store.keys("context").await.unwrap().is_empty());
    store.close().await.unwrap();
}

#[tokio::test]
async fn connect_from_config_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    let (host, port) = dead_address().await;
    let written = StoreConfig {
        host,
        port,
        ..fast_config()
    };
    written.write_to_file(&path).unwrap();

    let loaded = StoreConfig::from_file(&path).unwrap();
    assert_eq!(loaded, written);

    let store = scopestore::connect(loaded).await.unwrap();
    assert_eq!(store.prefix(), PREFIX);
    assert_ne!(store.state(), ConnectionState::Unopened);
    store.close().await.unwrap();
}
