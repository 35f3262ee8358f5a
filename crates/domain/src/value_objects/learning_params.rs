//! Adaptive learning parameters
//!
//! A hidden tone profile fed into the roleplay prompt. It is never shown to
//! the user. After every appended chat turn:
//! - `resilience` grows by [`RESILIENCE_STEP`], capped at 1.0
//! - `clarity` and `empathy` take a bounded random step of at most
//!   [`MAX_DRIFT`] in either direction, clamped to `[0, 1]`
//!
//! Randomness is injected as a closure so the walk is reproducible in tests.

use serde::{Deserialize, Serialize};

/// Resilience increase per recorded turn
pub const RESILIENCE_STEP: f64 = 0.02;

/// Largest magnitude of a single clarity/empathy step
pub const MAX_DRIFT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    pub resilience: f64,
    pub clarity: f64,
    pub empathy: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            resilience: 0.5,
            clarity: 0.5,
            empathy: 0.5,
        }
    }
}

impl LearningParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the parameters after one more turn.
    ///
    /// `drift` is called twice (clarity first, then empathy) and should yield
    /// values in `[-MAX_DRIFT, MAX_DRIFT]`. Values outside that range are
    /// clamped, so a misbehaving source can never break the bounds.
    pub fn advanced(&self, mut drift: impl FnMut() -> f64) -> Self {
        let clarity_step = drift().clamp(-MAX_DRIFT, MAX_DRIFT);
        let empathy_step = drift().clamp(-MAX_DRIFT, MAX_DRIFT);

        Self {
            resilience: (self.resilience + RESILIENCE_STEP).min(1.0),
            clarity: (self.clarity + clarity_step).clamp(0.0, 1.0),
            empathy: (self.empathy + empathy_step).clamp(0.0, 1.0),
        }
    }

    /// Prompt fragment, two decimals per value
    pub fn profile_line(&self) -> String {
        format!(
            "Resilience (Stamina): {:.2}, Clarity: {:.2}, Empathy: {:.2}",
            self.resilience, self.clarity, self.empathy
        )
    }
}
