//! Verbal sparring arcade: level and round generation plus the play loop.

mod engine;
mod referee;

use std::sync::Arc;

pub use engine::ArcadeEngine;
pub use referee::{
    batch_prompt, level_prompt, parse_level, parse_round, parse_round_batch, round_history_prompt,
    round_prompt, GenerationError, Referee,
};

/// Container for sparring use cases.
pub struct SparringUseCases {
    pub referee: Arc<Referee>,
    pub engine: Arc<ArcadeEngine>,
}

impl SparringUseCases {
    pub fn new(referee: Arc<Referee>, engine: Arc<ArcadeEngine>) -> Self {
        Self { referee, engine }
    }
}
