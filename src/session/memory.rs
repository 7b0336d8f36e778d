//! In-memory session store

use async_trait::async_trait;
use dashmap::DashMap;

use crate::session::{SessionData, SessionId, SessionStore};

/// Process-local session store over a concurrent map. Sessions live until
/// explicitly deleted or the process exits.
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Option<SessionData> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    async fn save(&self, id: &SessionId, data: SessionData) {
        self.sessions.insert(*id, data);
    }

    async fn delete(&self, id: &SessionId) {
        self.sessions.remove(id);
    }
}
