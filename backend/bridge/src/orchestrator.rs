//! Pairing/session state machine.
//!
//! Per pairing: `Unbound -> BindingQueued -> ProposalPending -> Approved | Rejected`,
//! `Approved -> Terminated`. A terminated pairing keeps its reuse binding, so a
//! later proposal on the same pairing goes straight back to `ProposalPending`.
//!
//! Every handler is a boundary: failures become a status event or a JSON-RPC
//! error response and are never propagated to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use signbridge_codec::decode;
use signbridge_core::codes::{INTERNAL_ERROR, INVALID_PARAMS, UNSUPPORTED_CHAINS, USER_REJECTED};
use signbridge_core::{
    BridgeError, Component, ErrorCode, Inbound, JsonRpcResponse, PairingRequest, SessionContext,
    SessionNamespace, SessionProposal, SessionRequest, StatusEvent, WalletSession,
};
use signbridge_logging::{BridgeEvent, BridgeEventLogger};
use signbridge_queue::{CorrelatedRpc, RpcError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::binding_store::BindingStore;
use crate::reply::Reply;
use crate::session_store::SessionStore;
use crate::status::StatusPublisher;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// CAIP-2 chain id sessions are approved for.
    pub network: String,
    /// Deadline for one signing round-trip.
    pub request_timeout: Duration,
    pub default_methods: Vec<String>,
    pub default_events: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            network: "stellar:pubnet".into(),
            request_timeout: Duration::from_secs(300),
            default_methods: vec!["stellar_signXDR".into(), "stellar_signAndSubmitXDR".into()],
            default_events: Vec::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Namespace part of the network, e.g. `stellar` for `stellar:pubnet`.
    fn namespace(&self) -> &str {
        self.network
            .split_once(':')
            .map_or(self.network.as_str(), |(ns, _)| ns)
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    wallet: Arc<dyn WalletSession>,
    status: StatusPublisher,
    signer: CorrelatedRpc,
    bindings: Arc<BindingStore>,
    sessions: Arc<SessionStore>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        wallet: Arc<dyn WalletSession>,
        status: StatusPublisher,
        signer: CorrelatedRpc,
    ) -> Self {
        Self {
            config,
            wallet,
            status,
            signer,
            bindings: Arc::new(BindingStore::new()),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    pub fn bindings(&self) -> &Arc<BindingStore> {
        &self.bindings
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Route one inbound event to its handler.
    pub async fn handle(&self, event: Inbound) {
        match event {
            Inbound::PairingRequest(bytes) => self.on_pairing_request(&bytes).await,
            Inbound::Proposal(proposal) => self.on_session_proposal(proposal).await,
            Inbound::Request(request) => self.on_session_request(request).await,
            Inbound::Delete { topic } => self.on_session_delete(&topic).await,
            Inbound::MalformedRequest { id, topic } => {
                warn!(%topic, id, "unreadable session request");
                self.answer(&topic, JsonRpcResponse::error(id, INVALID_PARAMS)).await;
            }
            Inbound::MalformedProposal { id } => {
                warn!(proposal_id = id, "unreadable session proposal");
                self.reject(id, "-", USER_REJECTED).await;
            }
        }
    }

    /// Publish a status event; a failed publish is only logged.
    pub async fn emit(&self, event: StatusEvent) {
        if let Err(e) = self.status.publish(&event).await {
            error!(status = event.kind(), error = %e, "failed to publish status event");
        }
    }

    // ── pairing ──────────────────────────────────────────────────────────

    pub async fn on_pairing_request(&self, bytes: &[u8]) {
        let request = match parse_pairing_request(bytes) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("dropping pairing request without wc_uri or address");
                return;
            }
            Err(e) => {
                warn!(error = %e, "unreadable pairing request");
                self.pairing_failed(&e).await;
                return;
            }
        };
        let (Some(uri), Some(address)) = (request.wc_uri.as_deref(), request.address.as_deref())
        else {
            return;
        };

        if let Err(e) = self.start_pairing(uri, address, &request).await {
            warn!(address, error = %e, "pairing failed");
            self.pairing_failed(&e).await;
        }
    }

    async fn pairing_failed(&self, e: &BridgeError) {
        BridgeEventLogger::log_event("-", BridgeEvent::Error { error_msg: e.to_string() });
        self.emit(StatusEvent::failed(e.to_string(), "pairing failed")).await;
    }

    async fn start_pairing(
        &self,
        uri: &str,
        address: &str,
        request: &PairingRequest,
    ) -> Result<(), BridgeError> {
        let metadata = request.metadata_map();
        // The binding stays queued if pairing fails below.
        self.bindings.enqueue(address, metadata.clone()).await;
        self.wallet.pair(uri).await?;
        info!(address, "pairing started");
        BridgeEventLogger::log_event(
            "-",
            BridgeEvent::PairingQueued { address: address.into() },
        );
        self.status.publish(&StatusEvent::queued(address, metadata)).await
    }

    // ── proposals ────────────────────────────────────────────────────────

    pub async fn on_session_proposal(&self, proposal: SessionProposal) {
        let Some(offered) = proposal.find_network(&self.config.network) else {
            info!(
                proposal_id = proposal.id,
                network = %self.config.network,
                "proposal does not offer the configured network"
            );
            self.reject(proposal.id, &proposal.pairing_topic, UNSUPPORTED_CHAINS).await;
            return;
        };

        let Some(binding) = self.bindings.dequeue_or_reuse(&proposal.pairing_topic).await else {
            info!(
                proposal_id = proposal.id,
                pairing_topic = %proposal.pairing_topic,
                "no address waiting for this proposal"
            );
            self.reject(proposal.id, &proposal.pairing_topic, USER_REJECTED).await;
            return;
        };

        let namespaces = self.grant(&binding.address, &offered.methods, &offered.events);
        if let Err(e) = self.approve(&proposal, binding.address, binding.metadata, namespaces).await {
            error!(proposal_id = proposal.id, error = %e, "approval failed");
            BridgeEventLogger::log_event(
                &proposal.pairing_topic,
                BridgeEvent::Error { error_msg: e.to_string() },
            );
            self.emit(StatusEvent::failed(e.to_string(), "session approval failed")).await;
        }
    }

    /// Namespaces granted for `address`, falling back to configured defaults.
    fn grant(
        &self,
        address: &str,
        methods: &[String],
        events: &[String],
    ) -> BTreeMap<String, SessionNamespace> {
        let pick = |offered: &[String], defaults: &[String]| {
            if offered.is_empty() {
                defaults.to_vec()
            } else {
                offered.to_vec()
            }
        };
        let namespace = SessionNamespace {
            chains: vec![self.config.network.clone()],
            accounts: vec![format!("{}:{address}", self.config.network)],
            methods: pick(methods, &self.config.default_methods),
            events: pick(events, &self.config.default_events),
        };
        BTreeMap::from([(self.config.namespace().to_string(), namespace)])
    }

    async fn approve(
        &self,
        proposal: &SessionProposal,
        address: String,
        metadata: signbridge_core::Metadata,
        namespaces: BTreeMap<String, SessionNamespace>,
    ) -> Result<(), BridgeError> {
        let session = self.wallet.approve(proposal.id, namespaces).await?;
        let dapp_info = if proposal.proposer.metadata.is_null() {
            session.peer.get("metadata").cloned().unwrap_or(Value::Null)
        } else {
            proposal.proposer.metadata.clone()
        };

        self.sessions
            .put(
                &session.topic,
                SessionContext {
                    address: address.clone(),
                    metadata: metadata.clone(),
                    dapp_info: dapp_info.clone(),
                    pairing_topic: proposal.pairing_topic.clone(),
                },
            )
            .await;
        self.bindings
            .bind_reuse(&proposal.pairing_topic, &address, metadata.clone())
            .await;

        info!(session = %session.topic, address = %address, "session approved");
        BridgeEventLogger::log_event(
            &session.topic,
            BridgeEvent::SessionApproved {
                address: address.clone(),
                dapp: dapp_info
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
        );
        self.status
            .publish(&StatusEvent::approved(&session.topic, address, metadata, dapp_info))
            .await
    }

    async fn reject(&self, proposal_id: u64, pairing_topic: &str, code: ErrorCode) {
        BridgeEventLogger::log_event(
            pairing_topic,
            BridgeEvent::SessionRejected { reason: code.message.into() },
        );
        if let Err(e) = self.wallet.reject(proposal_id, code).await {
            warn!(proposal_id, error = %e, "reject failed");
        }
    }

    // ── signing ──────────────────────────────────────────────────────────

    /// Forward a signing request to the backend and answer the dApp exactly once.
    pub async fn on_session_request(&self, request: SessionRequest) {
        let response = self.sign(&request).await;
        self.answer(&request.topic, response).await;
    }

    async fn answer(&self, topic: &str, response: JsonRpcResponse) {
        debug!(%topic, %response, "answering session request");
        let id = response.id;
        if let Err(e) = self.wallet.respond(topic, response).await {
            error!(%topic, id, error = %e, "failed to send response");
        }
    }

    async fn sign(&self, request: &SessionRequest) -> JsonRpcResponse {
        let (Some(context), Some(xdr)) = (self.sessions.get(&request.topic).await, request.xdr())
        else {
            warn!(topic = %request.topic, id = request.id, "unknown session or missing xdr");
            return JsonRpcResponse::error(request.id, INVALID_PARAMS);
        };

        let request_id = Uuid::new_v4().to_string();
        let body = json!({
            "request_id": request_id,
            "wc_req_id": request.id,
            "client_id": request.topic,
            "method": request.method(),
            "xdr": xdr,
            "address": context.address,
            "metadata": context.metadata,
            "dapp_info": context.dapp_info,
        });
        BridgeEventLogger::log_event(
            &request.topic,
            BridgeEvent::SigningForwarded {
                method: request.method().into(),
                request_id: request_id.clone(),
            },
        );

        let response = match self.signer.call(body, self.config.request_timeout).await {
            Ok(reply) => match Reply::classify(&reply) {
                Reply::Ok(result) => JsonRpcResponse::result(request.id, result),
                Reply::Err(message) => {
                    JsonRpcResponse::error_with_message(request.id, USER_REJECTED, message)
                }
            },
            Err(e @ RpcError::Timeout { .. }) => {
                warn!(%request_id, error = %e, "signing backend timed out");
                JsonRpcResponse::error(request.id, INTERNAL_ERROR)
            }
            Err(e) => {
                error!(%request_id, error = %e, "signing request failed");
                JsonRpcResponse::error(request.id, INTERNAL_ERROR)
            }
        };
        BridgeEventLogger::log_event(
            &request.topic,
            BridgeEvent::SigningAnswered {
                request_id,
                ok: response.error_code().is_none(),
            },
        );
        response
    }

    // ── termination ──────────────────────────────────────────────────────

    /// Forget the session. The pairing's reuse binding is kept.
    pub async fn on_session_delete(&self, topic: &str) {
        let context = self.sessions.remove(topic).await;
        info!(session = %topic, known = context.is_some(), "session ended");
        BridgeEventLogger::log_event(topic, BridgeEvent::SessionEnded);
        let (address, metadata) = match context {
            Some(ctx) => (Some(ctx.address), Some(ctx.metadata)),
            None => (None, None),
        };
        self.emit(StatusEvent::ended(topic, address, metadata)).await;
    }
}

/// `Ok(None)` when `wc_uri` or `address` is absent or empty; any other
/// unreadable body is an error.
fn parse_pairing_request(bytes: &[u8]) -> Result<Option<PairingRequest>, BridgeError> {
    let body = decode(bytes).json()?;
    let Value::Object(fields) = &body else {
        return Err(BridgeError::MalformedPayload(format!(
            "pairing request is not a JSON object: {body}"
        )));
    };
    let present = |key: &str| match fields.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    };
    if !present("wc_uri") || !present("address") {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(body)?))
}

#[async_trait]
impl Component for Orchestrator {
    fn name(&self) -> &str {
        "orchestrator"
    }

    /// Dispatch each event on its own task so slow signing calls never block
    /// proposals or deletions.
    async fn start(self: Arc<Self>, mut rx: mpsc::Receiver<Inbound>) -> Result<()> {
        info!("Orchestrator started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    debug!(kind = event.kind(), "dispatching wallet event");
                    let this = self.clone();
                    tasks.spawn(async move { this.handle(event).await });
                }
                Some(joined) = tasks.join_next() => log_join(joined),
            }
        }

        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        info!("Orchestrator stopped");
        Ok(())
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "event handler panicked");
        } else {
            warn!(error = %e, "event handler cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingWallet, WalletCall};
    use signbridge_codec::encode_binary;
    use signbridge_core::codes;
    use signbridge_queue::{MemoryTransport, QueueTransport};

    const STATUS: &str = "status";
    const SIGN: &str = "sign";
    const REPLY: &str = "reply:";

    struct Harness {
        transport: MemoryTransport,
        wallet: Arc<RecordingWallet>,
        orchestrator: Arc<Orchestrator>,
    }

    fn harness_with(config: OrchestratorConfig, wallet: RecordingWallet) -> Harness {
        let transport = MemoryTransport::new();
        let shared: Arc<dyn QueueTransport> = Arc::new(transport.clone());
        let wallet = Arc::new(wallet);
        let orchestrator = Arc::new(Orchestrator::new(
            config,
            wallet.clone(),
            StatusPublisher::new(shared.clone(), STATUS),
            CorrelatedRpc::new(shared, SIGN, REPLY).with_poll_tick(Duration::from_millis(20)),
        ));
        Harness {
            transport,
            wallet,
            orchestrator,
        }
    }

    fn harness() -> Harness {
        harness_with(OrchestratorConfig::default(), RecordingWallet::default())
    }

    impl Harness {
        async fn next_status(&self) -> Option<Value> {
            let bytes = self.transport.try_pop(STATUS).await?;
            decode(&bytes).json().ok()
        }

        async fn pairing(&self, body: Value) {
            let bytes = encode_binary(body.to_string().as_bytes(), &Default::default()).unwrap();
            self.orchestrator.on_pairing_request(&bytes).await;
        }

        async fn approved_session(&self, address: &str, pairing_topic: &str) -> String {
            self.pairing(json!({ "wc_uri": "wc:abc@2", "address": address })).await;
            self.orchestrator.on_session_proposal(proposal(1, pairing_topic)).await;
            self.next_status().await.unwrap();
            let approved = self.next_status().await.unwrap();
            approved["client_id"].as_str().unwrap().to_string()
        }

        /// Stand-in for the signing backend: answer the next request with `reply`.
        fn backend_replies(&self, reply: Value) -> tokio::task::JoinHandle<Value> {
            let transport = self.transport.clone();
            tokio::spawn(async move {
                let bytes = transport
                    .blocking_pop(SIGN, Duration::from_secs(2))
                    .await
                    .unwrap()
                    .expect("signing request pushed");
                let body = decode(&bytes).json().unwrap();
                let reply_to = body["replyTo"].as_str().unwrap();
                transport
                    .push(reply_to, reply.to_string().into_bytes())
                    .await
                    .unwrap();
                body
            })
        }
    }

    fn proposal(id: u64, pairing_topic: &str) -> SessionProposal {
        serde_json::from_value(json!({
            "id": id,
            "pairingTopic": pairing_topic,
            "proposer": { "metadata": { "name": "Demo dApp", "url": "https://dapp.example" } },
            "requiredNamespaces": {
                "stellar": {
                    "chains": ["stellar:pubnet"],
                    "methods": ["stellar_signXDR"],
                    "events": []
                }
            }
        }))
        .unwrap()
    }

    fn sign_request(id: u64, topic: &str, params: Value) -> SessionRequest {
        serde_json::from_value(json!({
            "id": id,
            "topic": topic,
            "params": {
                "request": { "method": "stellar_signXDR", "params": params },
                "chainId": "stellar:pubnet"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn pairing_request_queues_binding() {
        let h = harness();
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": "GABC", "metadata": { "user": 7 } }))
            .await;

        assert_eq!(h.wallet.calls().await, vec![WalletCall::Pair("wc:abc@2".into())]);
        assert_eq!(h.orchestrator.bindings().pending_len().await, 1);
        let status = h.next_status().await.unwrap();
        assert_eq!(status["status"], "queued");
        assert_eq!(status["address"], "GABC");
        assert_eq!(status["metadata"]["user"], 7);
    }

    #[tokio::test]
    async fn incomplete_pairing_request_is_dropped() {
        let h = harness();
        h.pairing(json!({ "wc_uri": "wc:abc@2" })).await;
        h.pairing(json!({ "address": "GABC" })).await;
        h.pairing(json!({ "wc_uri": "", "address": "GABC" })).await;
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": null })).await;

        assert!(h.wallet.calls().await.is_empty());
        assert!(h.next_status().await.is_none());
        assert_eq!(h.orchestrator.bindings().pending_len().await, 0);
    }

    #[tokio::test]
    async fn unreadable_pairing_request_emits_failed() {
        let h = harness();
        h.orchestrator.on_pairing_request(b"{not json").await;
        h.pairing(json!(["wc:abc@2", "GABC"])).await;
        h.pairing(json!({ "wc_uri": "wc:x", "address": 12345 })).await;

        for _ in 0..3 {
            let status = h.next_status().await.unwrap();
            assert_eq!(status["status"], "failed");
            assert_eq!(status["message"], "pairing failed");
            assert!(!status["error"].as_str().unwrap().is_empty());
        }
        assert!(h.next_status().await.is_none());
        assert!(h.wallet.calls().await.is_empty());
        assert_eq!(h.orchestrator.bindings().pending_len().await, 0);
    }

    #[tokio::test]
    async fn pairing_failure_emits_failed() {
        let h = harness_with(OrchestratorConfig::default(), RecordingWallet::failing_pair());
        h.pairing(json!({ "wc_uri": "wc:bad", "address": "GABC" })).await;

        let status = h.next_status().await.unwrap();
        assert_eq!(status["status"], "failed");
        assert!(status["error"].as_str().unwrap().contains("expired"));
        assert_eq!(h.orchestrator.bindings().pending_len().await, 1);
    }

    #[tokio::test]
    async fn pairing_then_proposal_approves_session() {
        let h = harness();
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": "GABC", "metadata": { "user": 7 } }))
            .await;
        h.orchestrator.on_session_proposal(proposal(1, "pair-1")).await;

        let calls = h.wallet.calls().await;
        let WalletCall::Approve { id, namespaces } = &calls[1] else {
            panic!("expected approve, got {calls:?}");
        };
        assert_eq!(*id, 1);
        let stellar = &namespaces["stellar"];
        assert_eq!(stellar.accounts, vec!["stellar:pubnet:GABC"]);
        assert_eq!(stellar.chains, vec!["stellar:pubnet"]);
        assert_eq!(stellar.methods, vec!["stellar_signXDR"]);

        assert_eq!(h.next_status().await.unwrap()["status"], "queued");
        let approved = h.next_status().await.unwrap();
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["client_id"], "session-1");
        assert_eq!(approved["address"], "GABC");
        assert_eq!(approved["metadata"]["user"], 7);
        assert_eq!(approved["dapp_info"]["name"], "Demo dApp");

        let ctx = h.orchestrator.sessions().get("session-1").await.unwrap();
        assert_eq!(ctx.pairing_topic, "pair-1");
    }

    #[tokio::test]
    async fn missing_methods_fall_back_to_defaults() {
        let h = harness();
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": "GABC" })).await;
        let proposal: SessionProposal = serde_json::from_value(json!({
            "id": 2,
            "pairingTopic": "pair-2",
            "optionalNamespaces": { "stellar:pubnet": {} }
        }))
        .unwrap();
        h.orchestrator.on_session_proposal(proposal).await;

        let calls = h.wallet.calls().await;
        let WalletCall::Approve { namespaces, .. } = &calls[1] else {
            panic!("expected approve, got {calls:?}");
        };
        assert_eq!(
            namespaces["stellar"].methods,
            vec!["stellar_signXDR", "stellar_signAndSubmitXDR"]
        );
        assert!(namespaces["stellar"].events.is_empty());
    }

    #[tokio::test]
    async fn optional_only_network_is_approved() {
        let h = harness();
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": "GABC" })).await;
        let proposal: SessionProposal = serde_json::from_value(json!({
            "id": 6,
            "pairingTopic": "pair-6",
            "requiredNamespaces": {},
            "optionalNamespaces": {
                "stellar": { "chains": ["stellar:pubnet"], "methods": ["stellar_signXDR"] }
            }
        }))
        .unwrap();
        h.orchestrator.on_session_proposal(proposal).await;

        let calls = h.wallet.calls().await;
        let WalletCall::Approve { id, namespaces } = &calls[1] else {
            panic!("expected approve, got {calls:?}");
        };
        assert_eq!(*id, 6);
        assert_eq!(namespaces["stellar"].accounts, vec!["stellar:pubnet:GABC"]);

        let queued = h.next_status().await.unwrap();
        assert_eq!(queued["status"], "queued");
        assert_eq!(queued["address"], "GABC");
        let approved = h.next_status().await.unwrap();
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["client_id"], "session-6");
        assert_eq!(approved["address"], "GABC");
        assert!(h.next_status().await.is_none());
    }

    #[tokio::test]
    async fn unsupported_network_is_rejected() {
        let h = harness_with(
            OrchestratorConfig {
                network: "stellar:testnet".into(),
                ..Default::default()
            },
            RecordingWallet::default(),
        );
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": "GABC" })).await;
        h.orchestrator.on_session_proposal(proposal(3, "pair-1")).await;

        let calls = h.wallet.calls().await;
        assert_eq!(calls[1], WalletCall::Reject { id: 3, code: codes::UNSUPPORTED_CHAINS.code });
        // Binding not consumed.
        assert_eq!(h.orchestrator.bindings().pending_len().await, 1);
    }

    #[tokio::test]
    async fn proposal_without_binding_is_rejected() {
        let h = harness();
        h.orchestrator.on_session_proposal(proposal(4, "pair-x")).await;

        assert_eq!(
            h.wallet.calls().await,
            vec![WalletCall::Reject { id: 4, code: codes::USER_REJECTED.code }]
        );
        assert!(h.next_status().await.is_none());
    }

    #[tokio::test]
    async fn binding_survives_termination() {
        let h = harness();
        let session = h.approved_session("GABC", "pair-1").await;

        h.orchestrator.on_session_delete(&session).await;
        let ended = h.next_status().await.unwrap();
        assert_eq!(ended["status"], "ended");
        assert_eq!(ended["client_id"], session.as_str());
        assert_eq!(ended["address"], "GABC");
        assert!(h.orchestrator.sessions().get(&session).await.is_none());

        // Same pairing proposes again without a new pairing request.
        h.orchestrator.on_session_proposal(proposal(5, "pair-1")).await;
        let approved = h.next_status().await.unwrap();
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["address"], "GABC");
        assert_eq!(approved["client_id"], "session-5");
    }

    #[tokio::test]
    async fn unknown_session_end_has_no_address() {
        let h = harness();
        h.orchestrator.on_session_delete("ghost").await;
        let ended = h.next_status().await.unwrap();
        assert_eq!(ended["status"], "ended");
        assert!(ended.get("address").is_none());
    }

    #[tokio::test]
    async fn stale_topic_gets_invalid_params() {
        let h = harness();
        h.orchestrator
            .on_session_request(sign_request(9, "gone", json!({ "xdr": "AAAA" })))
            .await;

        let calls = h.wallet.calls().await;
        let WalletCall::Respond { topic, response } = &calls[0] else {
            panic!("expected respond, got {calls:?}");
        };
        assert_eq!(topic, "gone");
        assert_eq!(response.error_code(), Some(codes::INVALID_PARAMS.code));
        assert_eq!(h.transport.len(SIGN).await, 0);
    }

    #[tokio::test]
    async fn missing_xdr_gets_invalid_params() {
        let h = harness();
        let session = h.approved_session("GABC", "pair-1").await;
        h.orchestrator
            .on_session_request(sign_request(10, &session, json!({ "memo": "x" })))
            .await;

        let response = h.wallet.last_response().await.unwrap();
        assert_eq!(response.error_code(), Some(codes::INVALID_PARAMS.code));
        assert_eq!(h.transport.len(SIGN).await, 0);
    }

    #[tokio::test]
    async fn signed_result_is_returned() {
        let h = harness();
        let session = h.approved_session("GABC", "pair-1").await;
        let backend = h.backend_replies(json!({ "result": { "signedXDR": "SIGNED" } }));

        h.orchestrator
            .on_session_request(sign_request(11, &session, json!([{ "xdr": "AAAA" }])))
            .await;

        let response = h.wallet.last_response().await.unwrap();
        assert_eq!(response.id, 11);
        assert_eq!(response.result_value(), Some(&json!({ "signedXDR": "SIGNED" })));

        let body = backend.await.unwrap();
        assert_eq!(body["wc_req_id"], 11);
        assert_eq!(body["client_id"], session.as_str());
        assert_eq!(body["method"], "stellar_signXDR");
        assert_eq!(body["xdr"], "AAAA");
        assert_eq!(body["address"], "GABC");
        assert_eq!(body["dapp_info"]["name"], "Demo dApp");
        assert!(body["request_id"].as_str().is_some());
        assert!(body["cid"].as_str().is_some());
    }

    #[tokio::test]
    async fn backend_error_is_user_rejected() {
        let h = harness();
        let session = h.approved_session("GABC", "pair-1").await;
        let _backend = h.backend_replies(json!({ "error": "user declined" }));

        h.orchestrator
            .on_session_request(sign_request(12, &session, json!({ "xdr": "AAAA" })))
            .await;

        let response = h.wallet.last_response().await.unwrap();
        assert_eq!(response.error_code(), Some(codes::USER_REJECTED.code));
        assert!(response.to_string().contains("5000"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["message"], "user declined");
    }

    #[tokio::test]
    async fn backend_silence_is_internal_error() {
        let h = harness_with(
            OrchestratorConfig {
                request_timeout: Duration::from_millis(100),
                ..Default::default()
            },
            RecordingWallet::default(),
        );
        let session = h.approved_session("GABC", "pair-1").await;

        h.orchestrator
            .on_session_request(sign_request(13, &session, json!({ "xdr": "AAAA" })))
            .await;

        let response = h.wallet.last_response().await.unwrap();
        assert_eq!(response.error_code(), Some(codes::INTERNAL_ERROR.code));
        // The request is left for the backend.
        assert_eq!(h.transport.len(SIGN).await, 1);
        assert_eq!(h.wallet.respond_count().await, 1);
    }

    #[tokio::test]
    async fn unreadable_request_gets_invalid_params() {
        let h = harness();
        h.orchestrator
            .handle(Inbound::MalformedRequest { id: 42, topic: "s1".into() })
            .await;

        let calls = h.wallet.calls().await;
        let WalletCall::Respond { topic, response } = &calls[0] else {
            panic!("expected respond, got {calls:?}");
        };
        assert_eq!(topic, "s1");
        assert_eq!(response.id, 42);
        assert_eq!(response.error_code(), Some(codes::INVALID_PARAMS.code));
        assert_eq!(h.wallet.respond_count().await, 1);
        assert_eq!(h.transport.len(SIGN).await, 0);
    }

    #[tokio::test]
    async fn unreadable_proposal_is_rejected() {
        let h = harness();
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": "GABC" })).await;
        h.orchestrator.handle(Inbound::MalformedProposal { id: 8 }).await;

        let calls = h.wallet.calls().await;
        assert_eq!(calls[1], WalletCall::Reject { id: 8, code: codes::USER_REJECTED.code });
        // The waiting address stays for a readable proposal.
        assert_eq!(h.orchestrator.bindings().pending_len().await, 1);
    }

    #[tokio::test]
    async fn component_dispatches_channel_events() {
        let h = harness();
        h.pairing(json!({ "wc_uri": "wc:abc@2", "address": "GABC" })).await;

        let (tx, rx) = mpsc::channel(8);
        let runner = tokio::spawn(h.orchestrator.clone().start(rx));
        tx.send(Inbound::Proposal(proposal(1, "pair-1"))).await.unwrap();
        tx.send(Inbound::Delete { topic: "ghost".into() }).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(2), runner)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(h.orchestrator.sessions().get("session-1").await.is_some());
        assert_eq!(h.orchestrator.bindings().pending_len().await, 0);
    }
}
