//! Bridge Event Logger
//!
//! Lifecycle milestones (pairing, session, signing) written through `tracing`
//! under the `bridge_events` target, so the NDJSON file can be filtered on it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    PairingQueued {
        address: String,
    },
    SessionApproved {
        address: String,
        dapp: String,
    },
    SessionRejected {
        reason: String,
    },
    SigningForwarded {
        method: String,
        request_id: String,
    },
    SigningAnswered {
        request_id: String,
        ok: bool,
    },
    SessionEnded,
    Error {
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    /// Pairing topic, or `-` before one exists.
    pub client_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: BridgeEvent,
}

pub struct BridgeEventLogger;

impl BridgeEventLogger {
    pub fn log_event(client_id: &str, mut event: BridgeEvent) {
        match &mut event {
            BridgeEvent::SessionRejected { reason } => {
                *reason = redact_sensitive_data(reason);
            }
            BridgeEvent::Error { error_msg } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            _ => {}
        }

        let entry = EventLogEntry {
            client_id: client_id.into(),
            timestamp: Utc::now(),
            event,
        };

        info!(
            target: "bridge_events",
            event = %serde_json::to_string(&entry).unwrap_or_default(),
            "Bridge lifecycle event"
        );
    }
}
