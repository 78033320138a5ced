use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Metadata;

/// Pairing/session status events published on the status queue.
///
/// Serialized with a `status` tag, e.g. `{"status":"queued","address":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusEvent {
    /// The bridge is wired up and consuming.
    Ready {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_id: Option<String>,
    },
    /// A pairing request was accepted and its address is waiting for a proposal.
    Queued {
        address: String,
        metadata: Metadata,
        message: String,
    },
    /// A session was approved for an address.
    Approved {
        client_id: String,
        address: String,
        metadata: Metadata,
        dapp_info: Value,
        message: String,
    },
    /// A session was terminated by either side.
    Ended {
        client_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Metadata>,
        message: String,
    },
    /// Pairing or approval failed.
    Failed { error: String, message: String },
}

impl StatusEvent {
    pub fn ready(project_id: Option<String>) -> Self {
        Self::Ready {
            message: "wallet bridge ready".into(),
            project_id,
        }
    }

    pub fn queued(address: impl Into<String>, metadata: Metadata) -> Self {
        Self::Queued {
            address: address.into(),
            metadata,
            message: "pairing started, waiting for session proposal".into(),
        }
    }

    pub fn approved(
        client_id: impl Into<String>,
        address: impl Into<String>,
        metadata: Metadata,
        dapp_info: Value,
    ) -> Self {
        Self::Approved {
            client_id: client_id.into(),
            address: address.into(),
            metadata,
            dapp_info,
            message: "session approved".into(),
        }
    }

    pub fn ended(
        client_id: impl Into<String>,
        address: Option<String>,
        metadata: Option<Metadata>,
    ) -> Self {
        Self::Ended {
            client_id: client_id.into(),
            address,
            metadata,
            message: "session ended".into(),
        }
    }

    pub fn failed(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
            message: message.into(),
        }
    }

    /// The `status` tag value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Queued { .. } => "queued",
            Self::Approved { .. } => "approved",
            Self::Ended { .. } => "ended",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}
