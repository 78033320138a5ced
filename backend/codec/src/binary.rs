//! Length-prefixed binary envelope.
//!
//! Layout, big-endian, offsets relative to the envelope start:
//!
//! ```text
//! 0   magic        8 bytes  \x89 B I N \r \n \x1a \n
//! 8   version      u16      (only 1 is understood)
//! 10  headers_at   u32      offset of the header block
//! 14  data_at      u32      offset of the body
//! ..  header block          u16 count, then (u16 len, key, u16 len, value)*
//! ..  body                  everything from data_at to the end
//! ```
//!
//! Some producers corrupt or drop the leading `\x89`, so the envelope is
//! located by the 7-byte tail of the magic and its start taken to be one byte
//! before it, even when that lands before the buffer.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::wire::{DecodedMessage, EncodeError, Headers};

pub const MAGIC: [u8; 8] = *b"\x89BIN\r\n\x1a\n";

pub const VERSION: u16 = 1;

/// Size of the fixed preamble (magic, version, two offsets).
const PREAMBLE_LEN: usize = 18;

fn marker() -> &'static [u8] {
    &MAGIC[1..]
}

/// Decode a binary envelope, or `None` if the buffer is not one.
pub fn decode_binary(buf: &[u8]) -> Option<DecodedMessage> {
    let marker_at = find(buf, marker())?;
    let start = marker_at as i64 - 1;

    let version = read_u16(buf, start + 8)?;
    let headers_at = read_u32(buf, start + 10)?;
    let data_at = read_u32(buf, start + 14)?;
    if version != VERSION {
        return None;
    }

    let body_start = start + i64::from(data_at);
    if body_start < 0 || body_start as usize > buf.len() {
        return None;
    }
    let body = String::from_utf8_lossy(&buf[body_start as usize..]).into_owned();
    let headers = read_headers(buf, start + i64::from(headers_at), body_start);

    Some(DecodedMessage { body, headers })
}

/// Encode `body` and `headers` as a version-1 binary envelope.
pub fn encode_binary(
    body: &[u8],
    headers: &BTreeMap<String, String>,
) -> Result<Vec<u8>, EncodeError> {
    let count = u16::try_from(headers.len()).map_err(|_| EncodeError::TooManyHeaders(headers.len()))?;

    let mut block = Vec::new();
    block.extend_from_slice(&count.to_be_bytes());
    for (key, value) in headers {
        push_field(&mut block, "header key", key.as_bytes())?;
        push_field(&mut block, "header value", value.as_bytes())?;
    }

    let data_at = u32::try_from(PREAMBLE_LEN + block.len()).map_err(|_| EncodeError::TooLarge)?;

    let mut out = Vec::with_capacity(PREAMBLE_LEN + block.len() + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_be_bytes());
    out.extend_from_slice(&(PREAMBLE_LEN as u32).to_be_bytes());
    out.extend_from_slice(&data_at.to_be_bytes());
    out.extend_from_slice(&block);
    out.extend_from_slice(body);
    Ok(out)
}

fn push_field(out: &mut Vec<u8>, field: &'static str, bytes: &[u8]) -> Result<(), EncodeError> {
    let len = u16::try_from(bytes.len()).map_err(|_| EncodeError::FieldTooLong {
        field,
        len: bytes.len(),
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Best-effort header parse; any inconsistency yields `None`.
fn read_headers(buf: &[u8], at: i64, limit: i64) -> Option<Headers> {
    let count = read_u16(buf, at)?;
    let mut pos = at + 2;
    let mut headers = Headers::new();
    for _ in 0..count {
        let key = read_str(buf, &mut pos, limit)?;
        let value = read_str(buf, &mut pos, limit)?;
        headers.insert(key, Value::String(value));
    }
    Some(headers)
}

fn read_str(buf: &[u8], pos: &mut i64, limit: i64) -> Option<String> {
    let len = i64::from(read_u16(buf, *pos)?);
    let from = *pos + 2;
    let to = from + len;
    if to > limit {
        return None;
    }
    let bytes = slice(buf, from, len as usize)?;
    *pos = to;
    String::from_utf8(bytes.to_vec()).ok()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn slice(buf: &[u8], at: i64, len: usize) -> Option<&[u8]> {
    let at = usize::try_from(at).ok()?;
    buf.get(at..at.checked_add(len)?)
}

fn read_u16(buf: &[u8], at: i64) -> Option<u16> {
    let bytes = slice(buf, at, 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(buf: &[u8], at: i64) -> Option<u32> {
    let bytes = slice(buf, at, 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
