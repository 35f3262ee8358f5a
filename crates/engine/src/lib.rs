//! Motstandstrener engine library.
//!
//! ## Structure
//!
//! - `infrastructure/` - Ports and adapters: model client, retry wrapper,
//!   agent gateway, session memory, profiler, settings
//! - `use_cases/` - Training services, the sparring arcade and the session
//!   state machine
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Shared test doubles.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
