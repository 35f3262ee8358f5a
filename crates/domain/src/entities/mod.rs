//! Domain entities - Core business objects

mod chat;
mod game_state;
mod scenario;
mod sparring;

pub use chat::{transcript_lines, ChatTurn};
pub use game_state::{ArcadePhase, Exchange, GameState, DEFAULT_ROUNDS_PER_LEVEL, LEVEL_CLEAR_SCORE};
pub use scenario::{Scenario, ScenarioContext, ScenarioOption};
pub use sparring::{
    OptionKind, SparringLevel, SparringOption, SparringRound, SparringTopic, ROUND_OPTION_COUNT,
};
