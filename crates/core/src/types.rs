//! Reply types returned by scope store operations

use serde::{Deserialize, Serialize};

/// Marker string for the disconnected sentinel in text form
pub const DISCONNECTED_FLAG: &str = "REDIS_DISCONNECTED";

/// Result of a single-value read or write
///
/// `Disconnected` means the value is unknown because the backend is down.
/// It is distinct from a legitimately absent value, which is `Value(None)`
/// for reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply<T> {
    /// The backend answered
    Value(T),
    /// The backend is known to be unreachable
    Disconnected,
}

impl<T> Reply<T> {
    /// Whether this is the disconnected sentinel
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Reply::Disconnected)
    }

    /// The answered value, if any
    pub fn into_value(self) -> Option<T> {
        match self {
            Reply::Value(v) => Some(v),
            Reply::Disconnected => None,
        }
    }

    /// Borrow the answered value, if any
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Reply::Value(v) => Some(v),
            Reply::Disconnected => None,
        }
    }

    /// Map the answered value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reply<U> {
        match self {
            Reply::Value(v) => Reply::Value(f(v)),
            Reply::Disconnected => Reply::Disconnected,
        }
    }
}

/// Acknowledgement of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ack {
    /// Value written
    Stored,
    /// Null write removed this many keys (0 if the key did not exist)
    Removed(u64),
}

impl std::fmt::Display for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ack::Stored => write!(f, "OK"),
            Ack::Removed(n) => write!(f, "{}", n),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Reply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Value(v) => std::fmt::Display::fmt(v, f),
            Reply::Disconnected => f.write_str(DISCONNECTED_FLAG),
        }
    }
}
