//! Built-in default values.

/// Public project id used when none is configured.
pub const DEFAULT_PROJECT_ID: &str = "3b5f8d1e6c2a4f0b9e7d1c3a5b8f2e60";

pub const DEFAULT_NETWORK: &str = "stellar:pubnet";

pub const DEFAULT_PAIRING_QUEUE: &str = "wallet:pairing:requests";
pub const DEFAULT_STATUS_QUEUE: &str = "wallet:pairing:status";
pub const DEFAULT_SIGNING_QUEUE: &str = "wallet:sign:requests";
pub const DEFAULT_REPLY_PREFIX: &str = "wallet:sign:reply:";
pub const DEFAULT_WALLET_COMMAND_QUEUE: &str = "wallet:session:commands";
pub const DEFAULT_WALLET_EVENT_QUEUE: &str = "wallet:session:events";
pub const DEFAULT_WALLET_REPLY_PREFIX: &str = "wallet:session:reply:";

/// Deadline for one signing round-trip.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Upper bound for one blocking pop while waiting on a reply.
pub const DEFAULT_POLL_TICK_SECS: u64 = 5;

/// Pause after a failed pop on an inbound queue.
pub const DEFAULT_CONSUMER_BACKOFF_MS: u64 = 1_000;

pub const DEFAULT_WALLET_COMMAND_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn default_methods() -> Vec<String> {
    vec!["stellar_signXDR".into(), "stellar_signAndSubmitXDR".into()]
}

pub fn default_events() -> Vec<String> {
    Vec::new()
}
