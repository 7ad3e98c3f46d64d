//! Key and value codec
//!
//! Pure functions mapping `(scope, key)` pairs to physical backing-store keys
//! and values to their wire text. No state, no I/O.
//!
//! ## Physical key format
//!
//! ```text
//! <prefix><scope>:<key>
//! ```
//!
//! This format is shared by every store instance using the same prefix and
//! must stay stable across versions. Patterns handed to the backend use Redis
//! glob syntax; the literal part (`prefix + scope + ":"`) is escaped so glob
//! metacharacters inside a scope name only ever match themselves.

use crate::error::{StoreError, StoreResult};
use serde_json::Value;

/// Separator between scope segments, and between the scope and the key
pub const SEPARATOR: char = ':';

/// Glob wildcard matching any suffix (zero or more characters)
pub const WILDCARD: char = '*';

const GLOB_META: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Physical key for `(scope, key)`: `prefix + scope + ":" + key`.
pub fn physical_key(prefix: &str, scope: &str, key: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + scope.len() + key.len() + 1);
    out.push_str(prefix);
    out.push_str(scope);
    out.push(SEPARATOR);
    out.push_str(key);
    out
}

/// Literal prefix shared by every physical key of a scope.
pub fn scope_prefix(prefix: &str, scope: &str) -> String {
    physical_key(prefix, scope, "")
}

/// Pattern enumerating every physical key of a scope.
pub fn scope_pattern(prefix: &str, scope: &str) -> String {
    let mut pattern = glob_escape(&scope_prefix(prefix, scope));
    pattern.push(WILDCARD);
    pattern
}

/// Pattern enumerating every physical key written under `prefix`.
pub fn global_pattern(prefix: &str) -> String {
    let mut pattern = glob_escape(prefix);
    pattern.push(WILDCARD);
    pattern
}

/// Bare key of `physical` if it belongs to `scope`.
pub fn strip_scope<'a>(prefix: &str, scope: &str, physical: &'a str) -> Option<&'a str> {
    physical
        .strip_prefix(prefix)?
        .strip_prefix(scope)?
        .strip_prefix(SEPARATOR)
}

/// Escape glob metacharacters so `literal` only matches itself.
pub fn glob_escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if GLOB_META.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Encode a value to its wire text.
///
/// `null` encodes to `None`, which callers treat as a deletion.
pub fn encode_value(value: &Value) -> StoreResult<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::to_string(value)
        .map(Some)
        .map_err(StoreError::from)
}

/// Decode wire text back into a value.
///
/// An absent key decodes to `null`. Text that is not valid JSON (written by a
/// foreign producer) is returned unchanged as a string.
pub fn decode_value(raw: Option<&str>) -> Value {
    match raw {
        None => Value::Null,
        Some(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
    }
}
