//! Recording wallet-session double for handler tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;
use signbridge_core::{
    ApprovedSession, ErrorCode, JsonRpcResponse, SessionNamespace, WalletError, WalletSession,
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum WalletCall {
    Pair(String),
    Approve {
        id: u64,
        namespaces: BTreeMap<String, SessionNamespace>,
    },
    Reject {
        id: u64,
        code: i64,
    },
    Respond {
        topic: String,
        response: JsonRpcResponse,
    },
}

/// Approves every proposal as `session-<id>`.
#[derive(Default)]
pub struct RecordingWallet {
    calls: Mutex<Vec<WalletCall>>,
    fail_pair: bool,
}

impl RecordingWallet {
    pub fn failing_pair() -> Self {
        Self {
            fail_pair: true,
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<WalletCall> {
        self.calls.lock().await.clone()
    }

    pub async fn last_response(&self) -> Option<JsonRpcResponse> {
        self.calls.lock().await.iter().rev().find_map(|call| match call {
            WalletCall::Respond { response, .. } => Some(response.clone()),
            _ => None,
        })
    }

    pub async fn respond_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, WalletCall::Respond { .. }))
            .count()
    }
}

#[async_trait]
impl WalletSession for RecordingWallet {
    async fn pair(&self, uri: &str) -> Result<(), WalletError> {
        self.calls.lock().await.push(WalletCall::Pair(uri.into()));
        if self.fail_pair {
            return Err(WalletError::Pairing("pairing uri expired".into()));
        }
        Ok(())
    }

    async fn approve(
        &self,
        proposal_id: u64,
        namespaces: BTreeMap<String, SessionNamespace>,
    ) -> Result<ApprovedSession, WalletError> {
        self.calls.lock().await.push(WalletCall::Approve {
            id: proposal_id,
            namespaces,
        });
        Ok(ApprovedSession {
            topic: format!("session-{proposal_id}"),
            peer: json!({ "metadata": { "name": "peer" } }),
        })
    }

    async fn reject(&self, proposal_id: u64, reason: ErrorCode) -> Result<(), WalletError> {
        self.calls.lock().await.push(WalletCall::Reject {
            id: proposal_id,
            code: reason.code,
        });
        Ok(())
    }

    async fn respond(&self, topic: &str, response: JsonRpcResponse) -> Result<(), WalletError> {
        self.calls.lock().await.push(WalletCall::Respond {
            topic: topic.into(),
            response,
        });
        Ok(())
    }
}
