//! Per-agent conversation memory
//!
//! Each conversational agent (scenario, feedback, reflection) gets its own
//! session id. Memory for a session lives behind [`SessionMemoryPort`]; a
//! phase restart clears the old session and hands out a fresh id rather than
//! editing stored items.
//!
//! [`SessionMemoryPort`]: crate::infrastructure::ports::SessionMemoryPort

mod memory;
mod sqlite;
mod store;

pub use memory::InMemorySessionMemory;
pub use sqlite::SqliteSessionMemory;
pub use store::{AgentSessions, SessionHandle, SESSION_ROLES};
