//! Backing stores for scopestore
//!
//! This crate provides the capability the scope store consumes:
//! - **Backend**: async trait for a flat, string-keyed store with glob enumeration
//! - **MemoryBackend**: in-process store with fault injection
//! - **RespBackend**: Redis-protocol (RESP2) client over TCP
//! - **glob**: Redis `KEYS` pattern matching

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod glob;
pub mod memory;
pub mod resp;
pub mod traits;

pub use memory::{Fault, MemoryBackend};
pub use resp::{RespBackend, RespOptions};
pub use traits::Backend;
