//! JSON envelope: `{"data": "<body>", "headers": {...}}`.

use serde::Serialize;
use serde_json::Value;

use crate::wire::{DecodedMessage, EncodeError, Headers};

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    data: &'a str,
    headers: &'a Headers,
}

/// Decode a JSON envelope whose `data` is a string.
pub fn decode_json(buf: &[u8]) -> Option<DecodedMessage> {
    let value: Value = serde_json::from_slice(buf).ok()?;
    let body = value.get("data")?.as_str()?.to_owned();
    let headers = value.get("headers").and_then(Value::as_object).cloned();
    Some(DecodedMessage { body, headers })
}

pub fn encode_json(body: &str, headers: &Headers) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(&JsonEnvelope {
        data: body,
        headers,
    })?)
}
