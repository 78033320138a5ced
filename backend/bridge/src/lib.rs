//! `signbridge-bridge` — pairing/session orchestration.
//!
//! Reconciles three asynchronous inputs: pairing requests from the queue,
//! session proposals and session requests from the wallet-session library.
//! Signing requests are forwarded to the backend as correlated calls.

pub mod binding_store;
pub mod consumer;
pub mod orchestrator;
pub mod reply;
pub mod session_store;
pub mod sidecar;
pub mod status;

#[cfg(test)]
mod testing;

pub use binding_store::BindingStore;
pub use consumer::PairingConsumer;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use session_store::SessionStore;
pub use sidecar::{SidecarWallet, WalletEventPump};
pub use status::StatusPublisher;
