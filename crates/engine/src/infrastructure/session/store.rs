use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::infrastructure::agent_gateway::AgentRole;
use crate::infrastructure::ports::{RandomPort, SessionMemoryPort, SessionStoreError};

/// Agents that keep conversation memory between turns
pub const SESSION_ROLES: [AgentRole; 3] =
    [AgentRole::Scenario, AgentRole::Feedback, AgentRole::Reflection];

/// Opaque reference to one agent's conversation memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: String,
    role: AgentRole,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// One live session handle per conversational agent
pub struct AgentSessions {
    memory: Arc<dyn SessionMemoryPort>,
    random: Arc<dyn RandomPort>,
    handles: HashMap<AgentRole, SessionHandle>,
}

impl AgentSessions {
    pub fn new(memory: Arc<dyn SessionMemoryPort>, random: Arc<dyn RandomPort>) -> Self {
        let mut sessions = Self {
            memory,
            random,
            handles: HashMap::new(),
        };
        for role in SESSION_ROLES {
            let handle = sessions.create(role);
            sessions.handles.insert(role, handle);
        }
        sessions
    }

    /// Mint a fresh handle with id `{role}-{uuid}`
    pub fn create(&self, role: AgentRole) -> SessionHandle {
        SessionHandle {
            id: format!("{}-{}", role.as_str(), self.random.gen_uuid()),
            role,
        }
    }

    /// Current handle for a conversational agent, `None` for stateless agents
    pub fn get(&self, role: AgentRole) -> Option<&SessionHandle> {
        self.handles.get(&role)
    }

    /// Delete every stored item behind a handle
    pub async fn clear(&self, handle: &SessionHandle) -> Result<(), SessionStoreError> {
        self.memory.clear_session(handle.id()).await
    }

    /// Clear the role's current session and swap in a fresh handle
    pub async fn replace(&mut self, role: AgentRole) -> Result<SessionHandle, SessionStoreError> {
        if let Some(old) = self.handles.get(&role) {
            self.memory.clear_session(old.id()).await?;
        }
        let fresh = self.create(role);
        tracing::debug!(role = %role, session = %fresh, "Agent session replaced");
        self.handles.insert(role, fresh.clone());
        Ok(fresh)
    }

    pub async fn reset_all(&mut self) -> Result<(), SessionStoreError> {
        for role in SESSION_ROLES {
            self.replace(role).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::ports::{MemoryItem, MessageRole, MockSessionMemoryPort};
    use crate::infrastructure::session::InMemorySessionMemory;

    #[test]
    fn test_new_creates_handle_per_conversational_agent() {
        let sessions = AgentSessions::new(
            Arc::new(InMemorySessionMemory::new()),
            Arc::new(FixedRandom(0)),
        );

        for role in SESSION_ROLES {
            let handle = sessions.get(role).unwrap();
            assert_eq!(handle.role(), role);
            assert!(handle.id().starts_with(&format!("{}-", role.as_str())));
        }
        assert!(sessions.get(AgentRole::Referee).is_none());
    }

    #[tokio::test]
    async fn test_replace_clears_old_memory_and_changes_id() {
        let memory = Arc::new(InMemorySessionMemory::new());
        let mut sessions = AgentSessions::new(memory.clone(), Arc::new(FixedRandom(0)));
        let old = sessions.get(AgentRole::Scenario).unwrap().clone();
        memory
            .append_items(old.id(), vec![MemoryItem::new(MessageRole::User, "hei")])
            .await
            .unwrap();

        let fresh = sessions.replace(AgentRole::Scenario).await.unwrap();

        assert_ne!(fresh, old);
        assert_eq!(sessions.get(AgentRole::Scenario), Some(&fresh));
        assert!(memory.load_items(old.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_all_clears_each_session_once() {
        let mut memory = MockSessionMemoryPort::new();
        memory.expect_clear_session().times(3).returning(|_| Ok(()));
        let mut sessions = AgentSessions::new(Arc::new(memory), Arc::new(FixedRandom(0)));

        sessions.reset_all().await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_propagates_store_failure() {
        let mut memory = MockSessionMemoryPort::new();
        memory
            .expect_clear_session()
            .returning(|_| Err(SessionStoreError::database("clear_session", "locked")));
        let mut sessions = AgentSessions::new(Arc::new(memory), Arc::new(FixedRandom(0)));
        let before = sessions.get(AgentRole::Feedback).unwrap().clone();

        assert!(sessions.replace(AgentRole::Feedback).await.is_err());
        assert_eq!(sessions.get(AgentRole::Feedback), Some(&before));
    }
}
