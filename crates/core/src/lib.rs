//! Core types for scopestore
//!
//! This crate defines the pure, I/O-free foundation of the system:
//! - Codec: `(scope, key)` ⇄ physical key mapping, glob patterns, value text
//! - Scope: hierarchy segments, `ActiveSet`, cleanup planning
//! - Types: `Reply` (value or disconnected sentinel) and `Ack`
//! - Error: `BackendError` / `StoreError` taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod scope;
pub mod types;

pub use codec::{
    decode_value, encode_value, global_pattern, physical_key, scope_pattern, scope_prefix,
    strip_scope, SEPARATOR, WILDCARD,
};
pub use error::{BackendError, BackendResult, StoreError, StoreResult};
pub use scope::{plan_cleanup, ActiveSet, GLOBAL_SCOPE};
pub use types::{Ack, Reply, DISCONNECTED_FLAG};

/// Value type stored by the facade
pub use serde_json::Value;
