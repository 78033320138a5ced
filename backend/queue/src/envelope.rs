//! Outbound JSON envelopes.

use serde_json::Value;
use signbridge_codec::{EncodeError, Headers, encode_json};

/// Envelope for a request expecting a reply on `reply_to`.
pub fn request_envelope(
    body: &Value,
    correlation_id: &str,
    reply_to: &str,
) -> Result<Vec<u8>, EncodeError> {
    let mut headers = Headers::new();
    headers.insert("reply_to".into(), reply_to.into());
    headers.insert("correlation_id".into(), correlation_id.into());
    headers.insert("content_type".into(), "application/json".into());
    headers.insert("content_encoding".into(), "utf-8".into());
    encode_json(&serde_json::to_string(body)?, &headers)
}

/// Envelope for a one-way event.
pub fn event_envelope(body: &Value, correlation_id: &str) -> Result<Vec<u8>, EncodeError> {
    let mut headers = Headers::new();
    headers.insert("correlation_id".into(), correlation_id.into());
    encode_json(&serde_json::to_string(body)?, &headers)
}
