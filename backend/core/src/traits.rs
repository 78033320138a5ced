use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::codes::ErrorCode;
use crate::error::WalletError;
use crate::message::Inbound;
use crate::types::{ApprovedSession, JsonRpcResponse, SessionNamespace};

/// A long-running bridge component fed from an inbound channel.
///
/// Each component runs in its own Tokio task.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Human-readable name of this component.
    fn name(&self) -> &str;

    /// Consume inbound events until the sender side is dropped.
    async fn start(self: Arc<Self>, rx: mpsc::Receiver<Inbound>) -> Result<()>;
}

/// The wallet-session library as seen by the bridge.
///
/// Implementations own pairing cryptography, relay transport and session
/// bookkeeping; the bridge only issues these four commands.
#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Start pairing with the dApp behind a `wc:` URI.
    async fn pair(&self, uri: &str) -> Result<(), WalletError>;

    /// Approve a proposal, returning the new session's topic.
    async fn approve(
        &self,
        proposal_id: u64,
        namespaces: BTreeMap<String, SessionNamespace>,
    ) -> Result<ApprovedSession, WalletError>;

    async fn reject(&self, proposal_id: u64, reason: ErrorCode) -> Result<(), WalletError>;

    /// Answer a session request.
    async fn respond(&self, topic: &str, response: JsonRpcResponse) -> Result<(), WalletError>;
}
