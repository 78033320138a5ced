use std::collections::HashMap;

use signbridge_core::SessionContext;
use tokio::sync::Mutex;

/// Approved, not yet terminated sessions keyed by session topic.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionContext>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, topic: impl Into<String>, context: SessionContext) {
        self.sessions.lock().await.insert(topic.into(), context);
    }

    pub async fn get(&self, topic: &str) -> Option<SessionContext> {
        self.sessions.lock().await.get(topic).cloned()
    }

    pub async fn remove(&self, topic: &str) -> Option<SessionContext> {
        self.sessions.lock().await.remove(topic)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
