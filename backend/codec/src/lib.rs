//! `signbridge-codec` — wire formats spoken on the queue substrate.
//!
//! Producers are heterogeneous: some write a length-prefixed binary envelope
//! (occasionally with a mangled first magic byte), some write a JSON envelope
//! `{"data": "...", "headers": {...}}`, some write the bare body. [`decode`]
//! accepts all three without being told which one it is looking at.

pub mod binary;
pub mod json;
pub mod wire;

pub use binary::{decode_binary, encode_binary, MAGIC};
pub use json::{decode_json, encode_json};
pub use wire::{decode, DecodedMessage, EncodeError, Headers};
