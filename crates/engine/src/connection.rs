//! Connection lifecycle
//!
//! Owns the backend handle and the health state machine the store consults
//! before every operation:
//!
//! ```text
//! Unopened --open()--> Connecting --success--> Ready
//!                      Connecting --failure--> Failed
//!                      Ready --error event--> Failed
//!                      Failed --reconnect--> Ready
//! {any} --close()--> Closed
//! ```
//!
//! `open()` spawns a supervisor task that connects with linear backoff and
//! unbounded retries. Connection failures never surface from `open()`; they
//! move the state to `Failed` and callers observe transitions through
//! [`Connection::subscribe`]. `Closed` is terminal.
//!
//! An "error event" is any backend failure classified as connection loss,
//! reported by the store through [`Connection::report_failure`], or a `Ready`
//! connection whose handle is found closed during [`Connection::check`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use scopestore_backend::Backend;
use scopestore_core::{BackendError, StoreError, StoreResult};
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ReconnectPolicy;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionState {
    /// `open()` not called yet
    Unopened,
    /// First connection attempt in flight
    Connecting,
    /// Connected and usable
    Ready,
    /// Known broken; the supervisor is reconnecting
    Failed,
    /// Explicitly closed; terminal
    Closed,
}

impl ConnectionState {
    /// Health flag: true exactly in `Failed`
    pub fn is_failed(&self) -> bool {
        matches!(self, ConnectionState::Failed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Unopened => "unopened",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Ready => "ready",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// State shared with the supervisor task
struct Shared {
    backend: Arc<dyn Backend>,
    policy: ReconnectPolicy,
    state: watch::Sender<ConnectionState>,
    wake: Notify,
}

impl Shared {
    fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Move to `next` unless closed or already there.
    fn transition(&self, next: ConnectionState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == ConnectionState::Closed || *current == next {
                return false;
            }
            debug!(target: "scopestore::conn", from = %current, to = %next, "State transition");
            *current = next;
            true
        })
    }

    /// Move `from -> to` only if currently in `from`.
    fn transition_from(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.state.send_if_modified(|current| {
            if *current != from {
                return false;
            }
            debug!(target: "scopestore::conn", from = %current, to = %to, "State transition");
            *current = to;
            true
        })
    }

    fn is_closed(&self) -> bool {
        self.current() == ConnectionState::Closed
    }
}

/// Backend handle plus health state machine
pub struct Connection {
    shared: Arc<Shared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("policy", &self.shared.policy)
            .finish()
    }
}

impl Connection {
    /// Wrap `backend`; nothing happens until [`open`](Self::open)
    pub fn new(backend: Arc<dyn Backend>, policy: ReconnectPolicy) -> Self {
        let (state, _) = watch::channel(ConnectionState::Unopened);
        Self {
            shared: Arc::new(Shared {
                backend,
                policy,
                state,
                wake: Notify::new(),
            }),
            supervisor: Mutex::new(None),
        }
    }

    /// The backend handle
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.shared.backend
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.shared.current()
    }

    /// Health flag
    pub fn is_failed(&self) -> bool {
        self.state().is_failed()
    }

    /// Receiver observing every state transition
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Start connecting in the background.
    ///
    /// Returns immediately. A no-op while a supervisor is already running or
    /// once the connection is closed.
    pub async fn open(&self) {
        let mut supervisor = self.supervisor.lock();
        if supervisor.as_ref().map_or(false, |h| !h.is_finished()) {
            debug!(target: "scopestore::conn", "open() while already open");
            return;
        }
        if self.shared.is_closed() {
            warn!(target: "scopestore::conn", "open() on a closed connection ignored");
            return;
        }
        self.shared.transition(ConnectionState::Connecting);
        *supervisor = Some(tokio::spawn(supervise(Arc::clone(&self.shared))));
    }

    /// Health check run before every data operation.
    ///
    /// # Errors
    ///
    /// - `ClientFailed` when the health flag is set (including a `Ready`
    ///   connection whose handle turned out to be closed)
    /// - `ClientNotConnected` when not opened yet, still connecting, or closed
    pub fn check(&self) -> StoreResult<()> {
        match self.state() {
            ConnectionState::Failed => Err(StoreError::ClientFailed),
            ConnectionState::Ready if self.shared.backend.is_open() => Ok(()),
            ConnectionState::Ready => {
                self.report_failure(&BackendError::Closed);
                Err(StoreError::ClientFailed)
            }
            ConnectionState::Unopened | ConnectionState::Connecting | ConnectionState::Closed => {
                Err(StoreError::ClientNotConnected)
            }
        }
    }

    /// Error event: the backend lost its connection.
    ///
    /// Moves `Ready -> Failed` and wakes the supervisor to reconnect.
    pub fn report_failure(&self, err: &BackendError) {
        if self
            .shared
            .transition_from(ConnectionState::Ready, ConnectionState::Failed)
        {
            error!(
                target: "scopestore::conn",
                error = %err,
                "Backend error, connection marked as failed"
            );
            self.shared.wake.notify_one();
        }
    }

    /// Wait until the state equals `target`.
    ///
    /// # Errors
    ///
    /// `Timeout` if `target` is not reached within `timeout`; `ClientNotConnected`
    /// if the connection closes first.
    pub async fn wait_for(&self, target: ConnectionState, timeout: Duration) -> StoreResult<()> {
        let mut rx = self.subscribe();
        let reached = tokio::time::timeout(timeout, async {
            rx.wait_for(|s| *s == target || *s == ConnectionState::Closed)
                .await
                .map(|s| *s)
        })
        .await;
        match reached {
            Ok(Ok(state)) if state == target => Ok(()),
            Ok(_) => Err(StoreError::ClientNotConnected),
            Err(_) => Err(StoreError::Timeout(timeout.as_millis() as u64)),
        }
    }

    /// Close the connection.
    ///
    /// Stops the supervisor, then gracefully disconnects if the backend is
    /// open or the health flag is set. The state becomes `Closed` on every
    /// path.
    ///
    /// # Errors
    ///
    /// `Close` carrying the backend error if the disconnect fails.
    pub async fn close(&self) -> StoreResult<()> {
        let supervisor = self.supervisor.lock().take();
        if let Some(handle) = supervisor {
            handle.abort();
            let _ = handle.await;
        }

        let was_failed = self.is_failed();
        let was_open = self.shared.backend.is_open();
        self.shared.state.send_modify(|s| *s = ConnectionState::Closed);
        self.shared.wake.notify_waiters();

        if !(was_open || was_failed) {
            return Ok(());
        }
        match self.shared.backend.disconnect().await {
            Ok(()) => {
                info!(target: "scopestore::conn", "Connection closed");
                Ok(())
            }
            Err(e) => {
                error!(target: "scopestore::conn", error = %e, "Error closing connection");
                Err(StoreError::Close(e))
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(handle) = self.supervisor.get_mut().take() {
            handle.abort();
        }
    }
}

/// Connect, then reconnect after every error event, until closed.
async fn supervise(shared: Arc<Shared>) {
    let mut attempt: u32 = 0;
    loop {
        match shared.backend.connect().await {
            Ok(()) => {
                attempt = 0;
                info!(target: "scopestore::conn", "Connected successfully");
                if !shared.transition(ConnectionState::Ready) && shared.is_closed() {
                    return;
                }
                wait_for_error_event(&shared).await;
                if shared.is_closed() {
                    return;
                }
            }
            Err(e) => {
                error!(target: "scopestore::conn", error = %e, attempt, "Connect failed");
                shared.transition(ConnectionState::Failed);
            }
        }
        if shared.is_closed() {
            return;
        }
        attempt = attempt.saturating_add(1);
        let delay = shared.policy.delay(attempt);
        warn!(
            target: "scopestore::conn",
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnect attempt #{}, retrying in {}ms",
            attempt,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }
}

/// Park until the connection is reported broken or closed.
///
/// Wake-ups whose failure was already healed (stale permits) are ignored.
async fn wait_for_error_event(shared: &Shared) {
    loop {
        shared.wake.notified().await;
        if shared.is_closed() || shared.current().is_failed() {
            return;
        }
    }
}
