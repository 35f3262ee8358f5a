//! Use cases - User story orchestration.
//!
//! `training` and `sparring` hold the agent-backed services; `session` walks
//! one user through them.

pub mod json;
pub mod session;
pub mod sparring;
pub mod training;

pub use session::{SessionError, Step, TrainingSession};
pub use sparring::SparringUseCases;
pub use training::TrainingUseCases;
