//! In-memory backend
//!
//! A process-local [`Backend`] holding keys in a `BTreeMap`. It implements the
//! full capability contract (glob enumeration included) and adds fault
//! injection so callers can drive the store through connection loss,
//! reconnection and server-side errors without a real server.
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(MemoryBackend::new());
//! backend.connect().await?;
//! backend.set("p:ctx:k", "\"v\"").await?;
//!
//! // Simulate the server going away
//! backend.set_reachable(false);
//! assert!(backend.get("p:ctx:k").await.is_err());
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use scopestore_core::{BackendError, BackendResult};

use crate::glob;
use crate::traits::Backend;

/// Failure injected into the next data operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The connection drops while the call is in flight
    ConnectionLoss,
    /// The server answers with an error reply
    Protocol(String),
}

impl Fault {
    fn into_error(self) -> BackendError {
        match self {
            Fault::ConnectionLoss => BackendError::Connection("connection reset by peer".into()),
            Fault::Protocol(msg) => BackendError::Protocol(msg),
        }
    }
}

/// In-memory backing store with fault injection
#[derive(Debug)]
pub struct MemoryBackend {
    data: Mutex<BTreeMap<String, String>>,
    open: AtomicBool,
    reachable: AtomicBool,
    disconnect_fails: AtomicBool,
    faults: Mutex<VecDeque<Fault>>,
    connect_attempts: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty, reachable, not yet connected backend
    pub fn new() -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
            open: AtomicBool::new(false),
            reachable: AtomicBool::new(true),
            disconnect_fails: AtomicBool::new(false),
            faults: Mutex::new(VecDeque::new()),
            connect_attempts: AtomicU64::new(0),
        }
    }

    /// Make the server reachable or unreachable.
    ///
    /// Going unreachable drops an open connection: in-flight and later calls
    /// fail with a connection-loss error until a reconnect succeeds.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
        if !reachable {
            self.open.store(false, Ordering::SeqCst);
        }
    }

    /// Drop the open connection once; the server stays reachable.
    pub fn drop_connection(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Queue a fault for the next data operation
    pub fn fail_next(&self, fault: Fault) {
        self.faults.lock().push_back(fault);
    }

    /// Make `disconnect` report an error
    pub fn set_disconnect_fails(&self, fails: bool) {
        self.disconnect_fails.store(fails, Ordering::SeqCst);
    }

    /// Number of `connect` calls so far, successful or not
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Write a raw physical entry, bypassing the connection
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.lock().insert(key.into(), value.into());
    }

    /// Copy of every stored entry, in key order
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data.lock().clone()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Gate every data operation: open connection, then queued faults.
    fn ready(&self) -> BackendResult<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }
        if let Some(fault) = self.faults.lock().pop_front() {
            let err = fault.into_error();
            if err.is_connection_loss() {
                self.open.store(false, Ordering::SeqCst);
            }
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn connect(&self) -> BackendResult<()> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(BackendError::Connection("connection refused".into()));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> BackendResult<()> {
        self.open.store(false, Ordering::SeqCst);
        if self.disconnect_fails.load(Ordering::SeqCst) {
            return Err(BackendError::Protocol("QUIT rejected".into()));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.ready()?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.ready()?;
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> BackendResult<u64> {
        self.ready()?;
        let mut data = self.data.lock();
        Ok(keys.iter().filter(|k| data.remove(k.as_str()).is_some()).count() as u64)
    }

    async fn keys(&self, pattern: &str) -> BackendResult<Vec<String>> {
        self.ready()?;
        Ok(self
            .data
            .lock()
            .keys()
            .filter(|k| glob::matches(pattern, k))
            .cloned()
            .collect())
    }
}
