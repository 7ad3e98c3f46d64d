//! get / set / delete / keys against a healthy backend

use crate::common::*;

#[tokio::test]
async fn set_then_get_round_trips() {
    let (store, _) = ready_store().await;
    store.set("context", "keyName", "keyValue").await.unwrap();
    assert_eq!(
        store.get("context", "keyName").await.unwrap(),
        Reply::Value(Some(json!("keyValue")))
    );
}

#[tokio::test]
async fn structured_values_round_trip() {
    let (store, _) = ready_store().await;
    let value = json!({"count": 3, "tags": ["a", "b"], "nested": {"ok": true}});
    store.set("flow:node", "state", value.clone()).await.unwrap();
    assert_eq!(
        store.get("flow:node", "state").await.unwrap(),
        Reply::Value(Some(value))
    );
}

#[tokio::test]
async fn missing_key_is_value_none() {
    let (store, _) = ready_store().await;
    let reply = store.get("context", "unknownKey").await.unwrap();
    assert_eq!(reply, Reply::Value(None));
    assert!(!reply.is_disconnected());
}

#[tokio::test]
async fn null_value_deletes_key() {
    let (store, backend) = ready_store().await;
    store.set("context", "key_del", "toBeDeleted").await.unwrap();
    store.set("context", "key_del", Value::Null).await.unwrap();
    assert_eq!(store.get("context", "key_del").await.unwrap(), Reply::Value(None));
    assert!(backend.is_empty());
}

#[tokio::test]
async fn set_acknowledges_store() {
    let (store, _) = ready_store().await;
    let ack = store.set("context", "k", 1).await.unwrap();
    assert_eq!(ack.to_string(), "OK");
    assert_eq!(ack.into_value(), Some(Ack::Stored));
}

#[tokio::test]
async fn scopes_are_isolated() {
    let (store, _) = ready_store().await;
    store.set("s1", "k", "one").await.unwrap();
    store.set("s2", "k", "two").await.unwrap();
    assert_eq!(store.get("s1", "k").await.unwrap(), Reply::Value(Some(json!("one"))));
    assert_eq!(store.get("s2", "k").await.unwrap(), Reply::Value(Some(json!("two"))));
}

#[tokio::test]
async fn keys_lists_bare_keys_of_scope() {
    let (store, _) = ready_store().await;
    store.clean(ActiveSet::empty()).await.unwrap();
    store.set("context", "key1", "v1").await.unwrap();
    store.set("context", "key2", "v2").await.unwrap();
    store.set("context", "key3", "v3").await.unwrap();
    store.set("global", "other", "v").await.unwrap();
    assert_eq!(sorted_keys(&store, "context").await, vec!["key1", "key2", "key3"]);
}

#[tokio::test]
async fn keys_of_empty_scope_is_empty() {
    let (store, _) = ready_store().await;
    assert!(store.keys("nothing-here").await.unwrap().is_empty());
}

#[tokio::test]
async fn keys_on_parent_scope_see_child_scopes() {
    let (store, _) = ready_store().await;
    store.set("a", "own", 1).await.unwrap();
    store.set("a:b", "child", 1).await.unwrap();
    assert_eq!(sorted_keys(&store, "a").await, vec!["b:child", "own"]);
    assert_eq!(sorted_keys(&store, "a:b").await, vec!["child"]);
}

#[tokio::test]
async fn delete_removes_only_that_scope() {
    let (store, _) = ready_store().await;
    store.set("context", "k1", "v1").await.unwrap();
    store.set("context", "k2", "v2").await.unwrap();
    store.set("global", "k3", "v3").await.unwrap();

    store.delete("context").await.unwrap();

    assert!(store.keys("context").await.unwrap().is_empty());
    assert_eq!(store.keys("global").await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_nonexistent_scope_is_noop() {
    let (store, backend) = ready_store().await;
    store.set("kept", "k", 1).await.unwrap();
    store.delete("nonexistentScope").await.unwrap();
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn other_prefix_is_invisible() {
    let (store, backend) = ready_store().await;
    let neighbour = ScopeStore::with_prefix("otherapp:", backend.clone());
    neighbour.open().await;
    neighbour.wait_ready(WAIT).await.unwrap();

    neighbour.set("context", "k", "theirs").await.unwrap();
    assert_eq!(store.get("context", "k").await.unwrap(), Reply::Value(None));
    store.delete("context").await.unwrap();
    assert_eq!(
        neighbour.get("context", "k").await.unwrap(),
        Reply::Value(Some(json!("theirs")))
    );
}
