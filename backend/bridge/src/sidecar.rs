//! Wallet-session library reached through a sidecar process on the queue substrate.
//!
//! Commands are correlated requests on the command queue:
//!
//! ```json
//! {"command":"pair","uri":"wc:..."}
//! {"command":"approve","id":1,"namespaces":{...}}
//! {"command":"reject","id":1,"reason":{"code":5000,"message":"User rejected."}}
//! {"command":"respond","topic":"...","response":{"id":1,"jsonrpc":"2.0","result":...}}
//! ```
//!
//! and are answered with `{"result": ...}` or `{"error": ...}`. Session events
//! flow the other way as `{"type": ..., "payload": ...}` bodies on the event
//! list, drained by [`WalletEventPump`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use signbridge_codec::decode;
use signbridge_core::{
    ApprovedSession, ErrorCode, Inbound, JsonRpcResponse, SessionNamespace, WalletError,
    WalletEvent, WalletSession,
};
use signbridge_logging::redact_sensitive_data;
use signbridge_queue::{CorrelatedRpc, QueueTransport};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::consumer::next_item;
use crate::reply::Reply;

pub struct SidecarWallet {
    rpc: CorrelatedRpc,
    timeout: Duration,
}

impl SidecarWallet {
    pub fn new(rpc: CorrelatedRpc, timeout: Duration) -> Self {
        Self { rpc, timeout }
    }

    async fn command(&self, body: Value) -> Result<Value, WalletError> {
        let command = body["command"].as_str().unwrap_or_default().to_string();
        let reply = self.rpc.call(body, self.timeout).await.map_err(|e| {
            if e.is_timeout() {
                WalletError::Timeout
            } else {
                WalletError::Unavailable(e.to_string())
            }
        })?;
        match Reply::classify(&reply) {
            Reply::Ok(result) => {
                debug!(%command, "sidecar command succeeded");
                Ok(result)
            }
            Reply::Err(message) => Err(WalletError::Rejected(message)),
        }
    }
}

#[async_trait]
impl WalletSession for SidecarWallet {
    async fn pair(&self, uri: &str) -> Result<(), WalletError> {
        self.command(json!({ "command": "pair", "uri": uri }))
            .await
            .map(drop)
            .map_err(|e| match e {
                WalletError::Rejected(message) => WalletError::Pairing(message),
                other => other,
            })
    }

    async fn approve(
        &self,
        proposal_id: u64,
        namespaces: BTreeMap<String, SessionNamespace>,
    ) -> Result<ApprovedSession, WalletError> {
        let result = self
            .command(json!({ "command": "approve", "id": proposal_id, "namespaces": namespaces }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| WalletError::Rejected(format!("malformed approve result: {e}")))
    }

    async fn reject(&self, proposal_id: u64, reason: ErrorCode) -> Result<(), WalletError> {
        self.command(json!({
            "command": "reject",
            "id": proposal_id,
            "reason": { "code": reason.code, "message": reason.message },
        }))
        .await
        .map(drop)
    }

    async fn respond(&self, topic: &str, response: JsonRpcResponse) -> Result<(), WalletError> {
        self.command(json!({ "command": "respond", "topic": topic, "response": response }))
            .await
            .map(drop)
    }
}

/// Drains the sidecar's event list into the orchestrator's inbound channel.
pub struct WalletEventPump {
    transport: Arc<dyn QueueTransport>,
    queue: String,
    backoff: Duration,
    tx: mpsc::Sender<Inbound>,
}

impl WalletEventPump {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        queue: impl Into<String>,
        backoff: Duration,
        tx: mpsc::Sender<Inbound>,
    ) -> Self {
        Self {
            transport,
            queue: queue.into(),
            backoff,
            tx,
        }
    }

    /// Run until shutdown, or until the orchestrator stops receiving.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(queue = %self.queue, "Wallet event pump started");
        while let Some(bytes) =
            next_item(self.transport.as_ref(), &self.queue, self.backoff, &mut shutdown).await
        {
            let Some(event) = parse_event(&bytes) else {
                continue;
            };
            if self.tx.send(event).await.is_err() {
                warn!("orchestrator channel closed");
                break;
            }
        }
        info!(queue = %self.queue, "Wallet event pump stopped");
    }
}

fn parse_event(bytes: &[u8]) -> Option<Inbound> {
    let message = decode(bytes);
    let Ok(body) = message.json() else {
        warn!(body = %redact_sensitive_data(&message.body), "skipping non-JSON wallet event");
        return None;
    };
    match serde_json::from_value::<WalletEvent>(body.clone()) {
        Ok(event) => Some(event.into()),
        Err(e) => {
            let salvaged = salvage(&body);
            if salvaged.is_none() {
                warn!(error = %e, "skipping unknown wallet event");
            }
            salvaged
        }
    }
}

/// A known event that failed to parse still has to be answered when its ids
/// can be read.
fn salvage(body: &Value) -> Option<Inbound> {
    let payload = &body["payload"];
    let id = payload["id"].as_u64()?;
    match body["type"].as_str()? {
        "session_request" => Some(Inbound::MalformedRequest {
            id,
            topic: payload["topic"].as_str()?.to_string(),
        }),
        "session_proposal" => Some(Inbound::MalformedProposal { id }),
        _ => None,
    }
}
