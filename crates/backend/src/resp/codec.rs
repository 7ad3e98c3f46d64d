//! RESP2 encoding and reply parsing
//!
//! Commands are always sent as arrays of bulk strings. Replies use the five
//! RESP2 types:
//! - Simple Strings (+)
//! - Errors (-)
//! - Integers (:)
//! - Bulk Strings ($), null as `$-1`
//! - Arrays (*), null as `*-1`

use scopestore_core::{BackendError, BackendResult};

/// Maximum bulk string size (512MB)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array elements
pub const MAX_ELEMENTS: usize = 1_000_000;

/// Maximum array nesting depth
pub const MAX_NESTING_DEPTH: usize = 32;

/// A decoded RESP2 value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// `+OK`
    Simple(String),
    /// `-ERR message`
    Error(String),
    /// `:42`
    Integer(i64),
    /// `$3\r\nfoo`, `None` for `$-1`
    Bulk(Option<Vec<u8>>),
    /// `*2 ...`, `None` for `*-1`
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// Interpret a bulk reply as UTF-8 text
    pub fn into_text(self) -> BackendResult<Option<String>> {
        match self {
            RespValue::Bulk(None) => Ok(None),
            RespValue::Bulk(Some(bytes)) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| BackendError::Protocol(format!("reply is not UTF-8: {}", e))),
            RespValue::Simple(s) => Ok(Some(s)),
            RespValue::Error(e) => Err(BackendError::Protocol(e)),
            other => Err(unexpected("bulk string", &other)),
        }
    }

    /// Interpret an integer reply
    pub fn into_integer(self) -> BackendResult<i64> {
        match self {
            RespValue::Integer(n) => Ok(n),
            RespValue::Error(e) => Err(BackendError::Protocol(e)),
            other => Err(unexpected("integer", &other)),
        }
    }

    /// Interpret an array-of-bulk-strings reply
    pub fn into_text_array(self) -> BackendResult<Vec<String>> {
        match self {
            RespValue::Array(None) => Ok(Vec::new()),
            RespValue::Array(Some(items)) => items
                .into_iter()
                .map(|item| {
                    item.into_text()?
                        .ok_or_else(|| unexpected("bulk string", &RespValue::Bulk(None)))
                })
                .collect(),
            RespValue::Error(e) => Err(BackendError::Protocol(e)),
            other => Err(unexpected("array", &other)),
        }
    }

    /// Require a `+OK`-style status reply
    pub fn into_status(self) -> BackendResult<()> {
        match self {
            RespValue::Simple(_) => Ok(()),
            RespValue::Error(e) => Err(BackendError::Protocol(e)),
            other => Err(unexpected("status", &other)),
        }
    }
}

fn unexpected(expected: &str, got: &RespValue) -> BackendError {
    BackendError::Protocol(format!("expected {} reply, got {:?}", expected, got))
}

/// Encode a command as an array of bulk strings.
pub fn encode_command<A: AsRef<[u8]>>(args: &[A]) -> Vec<u8> {
    let payload: usize = args.iter().map(|a| a.as_ref().len() + 16).sum();
    let mut buf = Vec::with_capacity(16 + payload);
    buf.push(b'*');
    buf.extend_from_slice(args.len().to_string().as_bytes());
    buf.extend_from_slice(b"\r\n");
    for arg in args {
        let arg = arg.as_ref();
        buf.push(b'$');
        buf.extend_from_slice(arg.len().to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(arg);
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

/// Parse one value from the front of `data`.
///
/// Returns `Ok(None)` when more bytes are needed, otherwise the value and the
/// number of bytes consumed.
pub fn parse_reply(data: &[u8]) -> BackendResult<Option<(RespValue, usize)>> {
    parse_value(data, 0)
}

fn parse_value(data: &[u8], depth: usize) -> BackendResult<Option<(RespValue, usize)>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(BackendError::Framing("maximum nesting depth exceeded".into()));
    }
    let Some(&type_byte) = data.first() else {
        return Ok(None);
    };
    let Some(line_end) = find_crlf(&data[1..]) else {
        return Ok(None);
    };
    let line = &data[1..1 + line_end];
    // Offset just past the header line's CRLF.
    let body = 1 + line_end + 2;

    match type_byte {
        b'+' => Ok(Some((RespValue::Simple(text(line)?), body))),
        b'-' => Ok(Some((RespValue::Error(text(line)?), body))),
        b':' => Ok(Some((RespValue::Integer(number(line)?), body))),
        b'$' => {
            let len = number(line)?;
            if len < 0 {
                return Ok(Some((RespValue::Bulk(None), body)));
            }
            let len = len as usize;
            if len > MAX_BULK_SIZE {
                return Err(BackendError::Framing(format!(
                    "bulk string too large: {} > {}",
                    len, MAX_BULK_SIZE
                )));
            }
            if data.len() < body + len + 2 {
                return Ok(None);
            }
            if &data[body + len..body + len + 2] != b"\r\n" {
                return Err(BackendError::Framing("bulk string missing CRLF".into()));
            }
            let payload = data[body..body + len].to_vec();
            Ok(Some((RespValue::Bulk(Some(payload)), body + len + 2)))
        }
        b'*' => {
            let count = number(line)?;
            if count < 0 {
                return Ok(Some((RespValue::Array(None), body)));
            }
            let count = count as usize;
            if count > MAX_ELEMENTS {
                return Err(BackendError::Framing(format!(
                    "too many array elements: {} > {}",
                    count, MAX_ELEMENTS
                )));
            }
            let mut items = Vec::with_capacity(count);
            let mut offset = body;
            for _ in 0..count {
                match parse_value(&data[offset..], depth + 1)? {
                    Some((item, used)) => {
                        items.push(item);
                        offset += used;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(Some(items)), offset)))
        }
        other => Err(BackendError::Framing(format!(
            "unknown reply type byte 0x{:02x}",
            other
        ))),
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

fn text(line: &[u8]) -> BackendResult<String> {
    String::from_utf8(line.to_vec())
        .map_err(|e| BackendError::Framing(format!("reply line is not UTF-8: {}", e)))
}

fn number(line: &[u8]) -> BackendResult<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| BackendError::Framing(format!("invalid length or integer: {:?}", line)))
}
