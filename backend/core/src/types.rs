use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codes::ErrorCode;

/// Opaque key/value metadata supplied alongside a wallet address.
pub type Metadata = serde_json::Map<String, Value>;

/// An address that finished pairing and is waiting for its session proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBinding {
    pub address: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl PendingBinding {
    pub fn new(address: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            address: address.into(),
            metadata,
        }
    }
}

/// Everything the bridge knows about an approved session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub address: String,
    pub metadata: Metadata,
    /// The dApp's self-description taken from the proposal.
    pub dapp_info: Value,
    pub pairing_topic: String,
}

/// Body of an inbound pairing request.
///
/// Both `wc_uri` and `address` are optional at the wire level so that a
/// malformed request can be recognised and dropped instead of failing to parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairingRequest {
    #[serde(default)]
    pub wc_uri: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl PairingRequest {
    /// Metadata as a map; anything that is not a JSON object becomes empty.
    pub fn metadata_map(&self) -> Metadata {
        match &self.metadata {
            Some(Value::Object(map)) => map.clone(),
            _ => Metadata::new(),
        }
    }
}

/// A namespace entry as offered by the dApp in a proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalNamespace {
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposer {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

/// A dApp's request to open a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProposal {
    pub id: u64,
    pub pairing_topic: String,
    #[serde(default)]
    pub proposer: Proposer,
    #[serde(default)]
    pub required_namespaces: BTreeMap<String, ProposalNamespace>,
    #[serde(default)]
    pub optional_namespaces: BTreeMap<String, ProposalNamespace>,
}

impl SessionProposal {
    /// Find the namespace offering `network`, required namespaces first.
    ///
    /// A namespace matches when its key is the network itself (the
    /// `"stellar:pubnet": {...}` shorthand) or when its `chains` list it.
    pub fn find_network(&self, network: &str) -> Option<&ProposalNamespace> {
        self.required_namespaces
            .iter()
            .chain(self.optional_namespaces.iter())
            .find(|(key, ns)| key.as_str() == network || ns.chains.iter().any(|c| c == network))
            .map(|(_, ns)| ns)
    }
}

/// Namespace granted to a session on approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionNamespace {
    pub chains: Vec<String>,
    pub accounts: Vec<String>,
    pub methods: Vec<String>,
    pub events: Vec<String>,
}

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedSession {
    /// Session topic, used as the session identifier from here on.
    pub topic: String,
    #[serde(default)]
    pub peer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestParams {
    pub request: RpcRequest,
    #[serde(default)]
    pub chain_id: Option<String>,
}

/// A dApp asking the wallet to act within an approved session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub id: u64,
    pub topic: String,
    pub params: SessionRequestParams,
}

impl SessionRequest {
    pub fn method(&self) -> &str {
        &self.params.request.method
    }

    /// The transaction envelope to sign.
    ///
    /// Accepted shapes: `{"xdr": "..."}`, `[{"xdr": "..."}]` and `["..."]`.
    pub fn xdr(&self) -> Option<&str> {
        let params = &self.params.request.params;
        let found = match params {
            Value::Object(map) => map.get("xdr"),
            Value::Array(items) => match items.first() {
                Some(Value::Object(map)) => map.get("xdr"),
                Some(first) => Some(first),
                None => None,
            },
            _ => None,
        };
        found.and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Error { error: JsonRpcError },
    Result { result: Value },
}

/// Response returned to the dApp for one session request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub id: u64,
    pub jsonrpc: String,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    pub fn result(id: u64, result: Value) -> Self {
        Self {
            id,
            jsonrpc: "2.0".into(),
            payload: ResponsePayload::Result { result },
        }
    }

    /// Error response using the code's canonical message.
    pub fn error(id: u64, code: ErrorCode) -> Self {
        Self::error_with_message(id, code, code.message)
    }

    pub fn error_with_message(id: u64, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            id,
            jsonrpc: "2.0".into(),
            payload: ResponsePayload::Error {
                error: JsonRpcError {
                    code: code.code,
                    message: message.into(),
                },
            },
        }
    }

    pub fn error_code(&self) -> Option<i64> {
        match &self.payload {
            ResponsePayload::Error { error } => Some(error.code),
            ResponsePayload::Result { .. } => None,
        }
    }

    pub fn result_value(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result { result } => Some(result),
            ResponsePayload::Error { .. } => None,
        }
    }
}

impl fmt::Display for JsonRpcResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            ResponsePayload::Result { .. } => write!(f, "result(id={})", self.id),
            ResponsePayload::Error { error } => {
                write!(f, "error(id={}, code={})", self.id, error.code)
            }
        }
    }
}
