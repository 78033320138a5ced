//! Log Redaction Layer
//!
//! Scrubs connection credentials and transaction envelopes from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static URL_CREDENTIALS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(rediss?://)[^\s/@]*@").unwrap());
// Base64 runs this long are XDR envelopes or signatures.
static BASE64_BLOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/]{64,}={0,2}").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = URL_CREDENTIALS_RE.replace_all(input, "${1}[REDACTED]@");

    BASE64_BLOB_RE
        .replace_all(&redacted, |caps: &regex::Captures| {
            let blob = &caps[0];
            format!("{}…[{} bytes]", &blob[..8], blob.len())
        })
        .into_owned()
}
