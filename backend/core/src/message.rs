use serde::{Deserialize, Serialize};

use crate::types::{SessionProposal, SessionRequest};

/// Everything the orchestrator reacts to, one variant per entry point.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// Raw bytes popped from the pairing-request queue.
    PairingRequest(Vec<u8>),
    Proposal(SessionProposal),
    Request(SessionRequest),
    /// Session termination, keyed by session topic.
    Delete { topic: String },
    /// A session request whose payload could not be read, beyond its id and topic.
    MalformedRequest { id: u64, topic: String },
    /// A proposal that could be identified but not read.
    MalformedProposal { id: u64 },
}

impl Inbound {
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::PairingRequest(_) => "pairing_request",
            Inbound::Proposal(_) => "session_proposal",
            Inbound::Request(_) => "session_request",
            Inbound::Delete { .. } => "session_delete",
            Inbound::MalformedRequest { .. } => "malformed_session_request",
            Inbound::MalformedProposal { .. } => "malformed_session_proposal",
        }
    }
}

/// Session events as emitted by the wallet-session sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WalletEvent {
    SessionProposal(SessionProposal),
    SessionRequest(SessionRequest),
    SessionDelete { topic: String },
}

impl From<WalletEvent> for Inbound {
    fn from(event: WalletEvent) -> Self {
        match event {
            WalletEvent::SessionProposal(p) => Inbound::Proposal(p),
            WalletEvent::SessionRequest(r) => Inbound::Request(r),
            WalletEvent::SessionDelete { topic } => Inbound::Delete { topic },
        }
    }
}
