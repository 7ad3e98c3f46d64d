//! Store engine for scopestore
//!
//! This crate ties the lower layers together:
//! - Configuration: `scopestore.toml` loading and validation
//! - Connection: lifecycle state machine with background reconnection
//! - ScopeStore: scoped get/set/delete/keys/clean with degraded-mode fallbacks
//! - Callback adapters for hosts that consume results through callbacks
//!
//! The engine is the only component that knows about connection health;
//! backends just report errors.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callback;
pub mod config;
pub mod connection;
pub mod store;

pub use config::{ReconnectPolicy, StoreConfig, CONFIG_FILE_NAME, DEFAULT_PREFIX};
pub use connection::{Connection, ConnectionState};
pub use store::ScopeStore;
