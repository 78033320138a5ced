//! Addresses waiting to be matched with a session proposal.
//!
//! Two structures live behind one lock:
//! - a FIFO of pending bindings, each consumed at most once
//! - a per-pairing reuse map, written on every approval and kept across
//!   session termination so a returning dApp can reconnect without a new
//!   pairing request

use std::collections::{HashMap, VecDeque};

use signbridge_core::{Metadata, PendingBinding};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct State {
    pending: VecDeque<PendingBinding>,
    reuse: HashMap<String, PendingBinding>,
}

#[derive(Default)]
pub struct BindingStore {
    state: Mutex<State>,
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, address: impl Into<String>, metadata: Metadata) {
        let mut state = self.state.lock().await;
        state.pending.push_back(PendingBinding::new(address, metadata));
        debug!(pending = state.pending.len(), "binding queued");
    }

    /// Oldest pending binding, else the reuse entry for `pairing_id`.
    ///
    /// The reuse entry is returned by copy and stays in place.
    pub async fn dequeue_or_reuse(&self, pairing_id: &str) -> Option<PendingBinding> {
        let mut state = self.state.lock().await;
        if let Some(binding) = state.pending.pop_front() {
            return Some(binding);
        }
        let reused = state.reuse.get(pairing_id).cloned();
        if reused.is_some() {
            debug!(pairing_id, "reusing binding for known pairing");
        }
        reused
    }

    /// Remember which address a pairing was approved for. Latest wins.
    pub async fn bind_reuse(&self, pairing_id: impl Into<String>, address: impl Into<String>, metadata: Metadata) {
        self.state
            .lock()
            .await
            .reuse
            .insert(pairing_id.into(), PendingBinding::new(address, metadata));
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Drop the reuse entry for a pairing that was torn down.
    pub async fn forget_pairing(&self, pairing_id: &str) -> Option<PendingBinding> {
        self.state.lock().await.reuse.remove(pairing_id)
    }
}
