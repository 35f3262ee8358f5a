//! Value objects - Immutable objects defined by their attributes

mod difficulty;
mod hit_points;
mod learning_params;

pub use difficulty::Difficulty;
pub use hit_points::{
    StartingHitPoints, BASE_HIT_POINTS, TIRED_PLAYER_FROM_LEVEL, TIRED_PLAYER_HIT_POINTS,
    TOUGH_OPPONENT_FROM_LEVEL, TOUGH_OPPONENT_HIT_POINTS,
};
pub use learning_params::{LearningParams, MAX_DRIFT, RESILIENCE_STEP};
