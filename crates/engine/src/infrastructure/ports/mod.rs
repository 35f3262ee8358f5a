//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - LLM calls (any OpenAI-compatible provider)
//! - Agent session memory (SQLite or in-memory)
//! - Telemetry (profiler or no-op)
//! - Clock/Random (for testing)

mod error;
mod external;
mod testing;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatMessage, FinishReason, LlmPort, LlmRequest, LlmResponse, MemoryItem, MessageRole,
    ResponseFormat, SessionMemoryPort, TelemetryPort, TokenUsage,
};

#[cfg(test)]
pub use external::{MockLlmPort, MockSessionMemoryPort};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{pick_index, ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{LlmError, SessionStoreError};
