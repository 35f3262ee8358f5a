//! Motstandstrener domain: scenarios, transcripts, learning parameters and the
//! verbal sparring rules. No I/O and no randomness of its own; callers inject
//! random sources as closures.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod game_rules;
pub mod value_objects;

pub use entities::{
    transcript_lines, ArcadePhase, ChatTurn, Exchange, GameState, OptionKind, Scenario,
    ScenarioContext, ScenarioOption, SparringLevel, SparringOption, SparringRound, SparringTopic,
    DEFAULT_ROUNDS_PER_LEVEL, LEVEL_CLEAR_SCORE, ROUND_OPTION_COUNT,
};
pub use error::DomainError;
pub use value_objects::{Difficulty, LearningParams, StartingHitPoints};
