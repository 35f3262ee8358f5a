//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Uniform integer in `min..=max`
    fn gen_range(&self, min: i32, max: i32) -> i32;
    /// Uniform float in `min..=max`
    fn gen_float(&self, min: f64, max: f64) -> f64;
    fn gen_uuid(&self) -> Uuid;
}

/// Uniform index into a slice of length `len` (`len` must be non-zero)
pub fn pick_index(random: &dyn RandomPort, len: usize) -> usize {
    let upper = i32::try_from(len.saturating_sub(1)).unwrap_or(i32::MAX);
    let picked = random.gen_range(0, upper).clamp(0, upper);
    usize::try_from(picked).unwrap_or(0)
}
