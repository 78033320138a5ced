use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// Reply channel (and list) name for a correlation id.
pub fn reply_channel_for(prefix: &str, correlation_id: &str) -> String {
    format!("{prefix}{correlation_id}")
}

/// Identity and deadline of one outbound call.
#[derive(Debug, Clone)]
pub struct CorrelationTicket {
    pub correlation_id: String,
    pub reply_channel: String,
    pub deadline: Instant,
}

impl CorrelationTicket {
    /// Issue a ticket with a fresh UUIDv4 correlation id.
    pub fn issue(reply_prefix: &str, timeout: Duration) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        Self {
            reply_channel: reply_channel_for(reply_prefix, &correlation_id),
            correlation_id,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
