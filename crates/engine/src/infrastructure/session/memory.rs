//! In-memory session memory, used in tests and when no database is configured.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::infrastructure::ports::{MemoryItem, SessionMemoryPort, SessionStoreError};

#[derive(Default)]
pub struct InMemorySessionMemory {
    sessions: DashMap<String, Vec<MemoryItem>>,
}

impl InMemorySessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions holding at least one item
    pub fn session_count(&self) -> usize {
        self.sessions.iter().filter(|e| !e.value().is_empty()).count()
    }
}

#[async_trait]
impl SessionMemoryPort for InMemorySessionMemory {
    async fn load_items(&self, session_id: &str) -> Result<Vec<MemoryItem>, SessionStoreError> {
        Ok(self
            .sessions
            .get(session_id)
            .map(|items| items.value().clone())
            .unwrap_or_default())
    }

    async fn append_items(
        &self,
        session_id: &str,
        items: Vec<MemoryItem>,
    ) -> Result<(), SessionStoreError> {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .extend(items);
        Ok(())
    }

    async fn clear_session(&self, session_id: &str) -> Result<(), SessionStoreError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
