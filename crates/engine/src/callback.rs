//! Callback-style invocation
//!
//! Each `*_with_callback` method spawns the corresponding async operation on
//! the Tokio runtime and hands its result to `callback` once done:
//!
//! - success: `Ok(result)`
//! - degraded backend: `Ok(fallback)`
//! - propagated failure: `Err(error)`
//!
//! The results are exactly those of the awaited methods; only delivery
//! differs. Must be called from within a Tokio runtime.

use std::future::Future;
use std::sync::Arc;

use scopestore_core::{Ack, ActiveSet, Reply, StoreResult, Value};
use tokio::task::JoinHandle;

use crate::store::ScopeStore;

fn spawn_with<T, Fut, C>(operation: Fut, callback: C) -> JoinHandle<()>
where
    T: Send + 'static,
    Fut: Future<Output = StoreResult<T>> + Send + 'static,
    C: FnOnce(StoreResult<T>) + Send + 'static,
{
    tokio::spawn(async move { callback(operation.await) })
}

impl ScopeStore {
    /// Callback form of [`get`](ScopeStore::get)
    pub fn get_with_callback<C>(
        self: &Arc<Self>,
        scope: impl Into<String>,
        key: impl Into<String>,
        callback: C,
    ) -> JoinHandle<()>
    where
        C: FnOnce(StoreResult<Reply<Option<Value>>>) + Send + 'static,
    {
        let store = Arc::clone(self);
        let (scope, key) = (scope.into(), key.into());
        spawn_with(async move { store.get(&scope, &key).await }, callback)
    }

    /// Callback form of [`set`](ScopeStore::set)
    pub fn set_with_callback<C>(
        self: &Arc<Self>,
        scope: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
        callback: C,
    ) -> JoinHandle<()>
    where
        C: FnOnce(StoreResult<Reply<Ack>>) + Send + 'static,
    {
        let store = Arc::clone(self);
        let (scope, key, value) = (scope.into(), key.into(), value.into());
        spawn_with(async move { store.set(&scope, &key, value).await }, callback)
    }

    /// Callback form of [`delete`](ScopeStore::delete)
    pub fn delete_with_callback<C>(
        self: &Arc<Self>,
        scope: impl Into<String>,
        callback: C,
    ) -> JoinHandle<()>
    where
        C: FnOnce(StoreResult<()>) + Send + 'static,
    {
        let store = Arc::clone(self);
        let scope = scope.into();
        spawn_with(async move { store.delete(&scope).await }, callback)
    }

    /// Callback form of [`keys`](ScopeStore::keys)
    pub fn keys_with_callback<C>(
        self: &Arc<Self>,
        scope: impl Into<String>,
        callback: C,
    ) -> JoinHandle<()>
    where
        C: FnOnce(StoreResult<Vec<String>>) + Send + 'static,
    {
        let store = Arc::clone(self);
        let scope = scope.into();
        spawn_with(async move { store.keys(&scope).await }, callback)
    }

    /// Callback form of [`clean`](ScopeStore::clean)
    pub fn clean_with_callback<C>(
        self: &Arc<Self>,
        active: impl Into<ActiveSet>,
        callback: C,
    ) -> JoinHandle<()>
    where
        C: FnOnce(StoreResult<()>) + Send + 'static,
    {
        let store = Arc::clone(self);
        let active = active.into();
        spawn_with(async move { store.clean(active).await }, callback)
    }
}
