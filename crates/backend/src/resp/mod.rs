//! Redis protocol backend.
//!
//! RESP2 encoding/parsing lives in `codec`; the TCP client implementing
//! [`Backend`](crate::Backend) lives in `client`.

pub mod client;
pub mod codec;

pub use client::{RespBackend, RespOptions};
pub use codec::{encode_command, parse_reply, RespValue};
