//! RESP2 client backend
//!
//! A single-connection Redis client over `tokio::net::TcpStream`. Requests are
//! serialized on the socket by an async mutex: one command is written, then its
//! reply is read in full before the next command starts.
//!
//! Any I/O failure drops the socket and marks the backend closed, so the
//! error surfaces as connection loss and the next `connect` starts fresh.
//! The same applies when a reply cannot be framed, or when a caller dropped a
//! request between writing the command and reading its reply.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use scopestore_core::{BackendError, BackendResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use super::codec::{encode_command, parse_reply, RespValue};
use crate::traits::Backend;

const READ_CHUNK: usize = 4096;

/// Connection settings for [`RespBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespOptions {
    /// `host:port` to connect to
    pub address: String,
    /// Password sent with `AUTH` after connecting
    pub password: Option<String>,
    /// Logical database selected with `SELECT` (skipped for 0)
    pub db: u32,
}

impl RespOptions {
    /// Options for `address` with no password on database 0
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: None,
            db: 0,
        }
    }
}

struct Socket {
    stream: TcpStream,
    buf: Vec<u8>,
    /// Set while a command's reply is still owed. Still set at the start of
    /// the next request means the previous one was cancelled mid-flight and
    /// its reply would be read as ours.
    in_flight: bool,
}

impl Socket {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            buf: Vec::with_capacity(READ_CHUNK),
            in_flight: false,
        }
    }

    async fn request<A: AsRef<[u8]>>(&mut self, args: &[A]) -> BackendResult<RespValue> {
        if self.in_flight {
            return Err(BackendError::Closed);
        }
        self.in_flight = true;
        self.stream.write_all(&encode_command(args)).await?;
        loop {
            if let Some((value, used)) = parse_reply(&self.buf)? {
                self.buf.drain(..used);
                self.in_flight = false;
                return Ok(value);
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(BackendError::Closed);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Redis-protocol backend over TCP
pub struct RespBackend {
    options: RespOptions,
    socket: Mutex<Option<Socket>>,
    open: AtomicBool,
}

impl std::fmt::Debug for RespBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespBackend")
            .field("address", &self.options.address)
            .field("db", &self.options.db)
            .field("open", &self.is_open())
            .finish()
    }
}

impl RespBackend {
    /// Create a backend; no connection is made until [`Backend::connect`]
    pub fn new(options: RespOptions) -> Self {
        Self {
            options,
            socket: Mutex::new(None),
            open: AtomicBool::new(false),
        }
    }

    /// Connection settings
    pub fn options(&self) -> &RespOptions {
        &self.options
    }

    /// Send one command and read its reply.
    ///
    /// Error replies are returned as `RespValue::Error`; interpreting them is
    /// left to the caller. Transport failures, unparseable replies and a
    /// socket left owing the reply of a cancelled request all drop the socket.
    async fn call<A: AsRef<[u8]>>(&self, args: &[A]) -> BackendResult<RespValue> {
        let mut guard = self.socket.lock().await;
        let Some(socket) = guard.as_mut() else {
            return Err(BackendError::Closed);
        };
        match socket.request(args).await {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_connection_loss() {
                    debug!(
                        target: "scopestore::resp",
                        error = %e,
                        "Dropping socket after transport or framing failure"
                    );
                    *guard = None;
                    self.open.store(false, Ordering::SeqCst);
                }
                Err(e)
            }
        }
    }

    async fn handshake(&self, socket: &mut Socket) -> BackendResult<()> {
        if let Some(password) = &self.options.password {
            socket.request(&["AUTH", password.as_str()]).await?.into_status()?;
        }
        if self.options.db != 0 {
            let db = self.options.db.to_string();
            socket.request(&["SELECT", db.as_str()]).await?.into_status()?;
        }
        Ok(())
    }
}

fn key_args<'a>(command: &'a str, keys: &'a [String]) -> Vec<&'a str> {
    std::iter::once(command)
        .chain(keys.iter().map(String::as_str))
        .collect()
}

#[async_trait]
impl Backend for RespBackend {
    async fn connect(&self) -> BackendResult<()> {
        let stream = TcpStream::connect(&self.options.address)
            .await
            .map_err(|e| BackendError::Connection(format!("{}: {}", self.options.address, e)))?;
        stream.set_nodelay(true)?;
        let mut socket = Socket::new(stream);
        self.handshake(&mut socket).await?;

        *self.socket.lock().await = Some(socket);
        self.open.store(true, Ordering::SeqCst);
        debug!(
            target: "scopestore::resp",
            address = %self.options.address,
            db = self.options.db,
            "Socket connected"
        );
        Ok(())
    }

    async fn disconnect(&self) -> BackendResult<()> {
        let mut guard = self.socket.lock().await;
        self.open.store(false, Ordering::SeqCst);
        let Some(mut socket) = guard.take() else {
            return Ok(());
        };
        let result = socket.request(&["QUIT"]).await.and_then(RespValue::into_status);
        let _ = socket.stream.shutdown().await;
        result
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.call(&["GET", key]).await?.into_text()
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.call(&["SET", key, value]).await?.into_status()
    }

    async fn del(&self, keys: &[String]) -> BackendResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let n = self.call(&key_args("DEL", keys)).await?.into_integer()?;
        Ok(n.max(0) as u64)
    }

    async fn unlink(&self, keys: &[String]) -> BackendResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let n = self.call(&key_args("UNLINK", keys)).await?.into_integer()?;
        Ok(n.max(0) as u64)
    }

    async fn keys(&self, pattern: &str) -> BackendResult<Vec<String>> {
        self.call(&["KEYS", pattern]).await?.into_text_array()
    }
}
