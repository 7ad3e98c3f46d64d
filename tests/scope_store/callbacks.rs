//! Callback mode delivers exactly what direct calls return

use std::sync::Arc;

use crate::common::*;
use scopestore::StoreResult;
use tokio::sync::oneshot;

/// Adapt a oneshot sender into a result callback.
fn deliver<T: Send + 'static>() -> (
    impl FnOnce(StoreResult<T>) + Send + 'static,
    oneshot::Receiver<StoreResult<T>>,
) {
    let (tx, rx) = oneshot::channel();
    (
        move |result| {
            let _ = tx.send(result);
        },
        rx,
    )
}

#[tokio::test]
async fn set_and_get_via_callback() {
    let (store, _) = ready_store().await;

    let (cb, rx) = deliver::<Reply<Ack>>();
    store.set_with_callback("context", "cbKey", "cbVal", cb);
    let ack = rx.await.unwrap().unwrap();
    assert_eq!(ack.to_string(), "OK");

    let (cb, rx) = deliver::<Reply<Option<Value>>>();
    store.get_with_callback("context", "cbKey", cb);
    assert_eq!(rx.await.unwrap().unwrap(), Reply::Value(Some(json!("cbVal"))));
}

#[tokio::test]
async fn callback_and_direct_agree() {
    let (store, _) = ready_store().await;
    store.set("a:b", "x", 1).await.unwrap();
    store.set("a:b", "y", 2).await.unwrap();
    store.set("c", "z", 3).await.unwrap();

    let direct = sorted_keys(&store, "a:b").await;
    let (cb, rx) = deliver::<Vec<String>>();
    store.keys_with_callback("a:b", cb);
    let mut via_callback = rx.await.unwrap().unwrap();
    via_callback.sort();
    assert_eq!(direct, via_callback);

    let (cb, rx) = deliver::<Reply<Option<Value>>>();
    store.get_with_callback("c", "z", cb);
    assert_eq!(rx.await.unwrap().unwrap(), store.get("c", "z").await.unwrap());
}

#[tokio::test]
async fn delete_and_clean_via_callback() {
    let (store, backend) = ready_store().await;
    store.set("gone", "k", 1).await.unwrap();
    store.set("dead:scope", "k", 1).await.unwrap();
    store.set("global", "k", 1).await.unwrap();

    let (cb, rx) = deliver::<()>();
    store.delete_with_callback("gone", cb);
    rx.await.unwrap().unwrap();
    assert_eq!(backend.len(), 2);

    let (cb, rx) = deliver::<()>();
    store.clean_with_callback(ActiveSet::empty(), cb);
    rx.await.unwrap().unwrap();
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn degraded_callback_gets_fallback_not_error() {
    let (store, backend) = ready_store().await;
    degrade(&store, &backend).await;

    let (cb, rx) = deliver::<Reply<Option<Value>>>();
    store.get_with_callback("context", "k", cb);
    assert_eq!(rx.await.unwrap().unwrap(), Reply::Disconnected);

    let (cb, rx) = deliver::<Reply<Ack>>();
    store.set_with_callback("context", "k", 1, cb);
    assert_eq!(rx.await.unwrap().unwrap(), Reply::Disconnected);
}

#[tokio::test]
async fn unopened_store_delivers_error() {
    init_tracing();
    let store = Arc::new(ScopeStore::new(&fast_config(), Arc::new(MemoryBackend::new())));
    let (cb, rx) = deliver::<Vec<String>>();
    store.keys_with_callback("context", cb);
    assert!(matches!(
        rx.await.unwrap(),
        Err(StoreError::ClientNotConnected)
    ));
}
