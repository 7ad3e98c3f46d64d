//! Operations while the backend is unreachable return fallbacks, never errors

use crate::common::*;

#[tokio::test]
async fn get_returns_disconnected_sentinel() {
    let (store, backend) = ready_store().await;
    degrade(&store, &backend).await;
    let reply = store.get("context", "anyKey").await.unwrap();
    assert!(reply.is_disconnected());
    assert_eq!(reply.to_string(), scopestore::DISCONNECTED_FLAG);
}

#[tokio::test]
async fn set_does_not_fail() {
    let (store, backend) = ready_store().await;
    degrade(&store, &backend).await;
    assert_eq!(store.set("context", "key", "val").await.unwrap(), Reply::Disconnected);
}

#[tokio::test]
async fn set_null_does_not_fail() {
    let (store, backend) = ready_store().await;
    degrade(&store, &backend).await;
    assert_eq!(store.set("context", "key", Value::Null).await.unwrap(), Reply::Disconnected);
}

#[tokio::test]
async fn delete_does_not_fail() {
    let (store, backend) = ready_store().await;
    degrade(&store, &backend).await;
    store.delete("context").await.unwrap();
}

#[tokio::test]
async fn keys_returns_empty() {
    let (store, backend) = ready_store().await;
    store.set("context", "k", 1).await.unwrap();
    degrade(&store, &backend).await;
    assert!(store.keys("context").await.unwrap().is_empty());
}

#[tokio::test]
async fn clean_does_not_fail() {
    let (store, backend) = ready_store().await;
    store.set("dead", "k", 1).await.unwrap();
    degrade(&store, &backend).await;
    store.clean(["context"]).await.unwrap();
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn fallbacks_for_keys_and_get_together() {
    let (store, backend) = ready_store().await;
    degrade(&store, &backend).await;
    assert!(store.keys("context").await.unwrap().is_empty());
    assert_eq!(store.get("context", "key").await.unwrap(), Reply::Disconnected);
}

#[tokio::test]
async fn mid_operation_loss_degrades_that_call() {
    let (store, backend) = ready_store().await;
    backend.fail_next(Fault::ConnectionLoss);
    assert_eq!(store.get("context", "k").await.unwrap(), Reply::Disconnected);
    assert!(store.is_failed());
}

#[tokio::test]
async fn logical_errors_still_propagate_when_healthy() {
    let (store, backend) = ready_store().await;
    backend.fail_next(Fault::Protocol("WRONGTYPE Operation against a key".into()));
    let err = store.keys("context").await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
    assert!(!err.is_connection_loss());
    assert_eq!(store.state(), ConnectionState::Ready);
}

#[tokio::test]
async fn recovers_after_backend_returns() {
    let (store, backend) = ready_store().await;
    store.set("context", "k", "kept").await.unwrap();
    degrade(&store, &backend).await;

    backend.set_reachable(true);
    store.wait_ready(WAIT).await.unwrap();

    assert!(!store.is_failed());
    assert_eq!(
        store.get("context", "k").await.unwrap(),
        Reply::Value(Some(json!("kept")))
    );
}
