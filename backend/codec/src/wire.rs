use thiserror::Error;
use tracing::trace;

use crate::binary::decode_binary;
use crate::json::decode_json;

/// Header map carried by an envelope.
pub type Headers = serde_json::Map<String, serde_json::Value>;

/// Output of [`decode`]: the UTF-8 body and whatever headers came with it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedMessage {
    pub body: String,
    pub headers: Option<Headers>,
}

impl DecodedMessage {
    pub fn raw(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            headers: None,
        }
    }

    /// Look up a header as a string.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.as_ref()?.get(key)?.as_str()
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{field} is {len} bytes, envelope fields are limited to 65535")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("{0} headers do not fit in an envelope")]
    TooManyHeaders(usize),

    #[error("envelope is larger than 4 GiB")]
    TooLarge,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Decode a queue payload. Never fails.
///
/// Tries the binary envelope, then the JSON envelope, then falls back to the
/// bytes themselves as (lossy) UTF-8. Validation of the body is left to the
/// caller's JSON parsing.
pub fn decode(buf: &[u8]) -> DecodedMessage {
    if let Some(msg) = decode_binary(buf) {
        trace!(len = buf.len(), "decoded binary envelope");
        return msg;
    }
    if let Some(msg) = decode_json(buf) {
        trace!(len = buf.len(), "decoded json envelope");
        return msg;
    }
    trace!(len = buf.len(), "raw payload");
    DecodedMessage::raw(String::from_utf8_lossy(buf))
}
