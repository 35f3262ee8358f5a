//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod agent_gateway;
pub mod clock;
pub mod openai;
pub mod ports;
pub mod profiler;
pub mod resilient_llm;
pub mod session;
pub mod settings;
