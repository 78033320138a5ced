//! Structured logging for the signing bridge.
//!
//! Console plus optional rolling NDJSON output, credential/XDR redaction, and
//! a typed event log for pairing and signing lifecycle milestones.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{BridgeEvent, BridgeEventLogger, EventLogEntry};
pub use logger::{LogGuard, init_logger};
pub use redact::redact_sensitive_data;
