//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_float(&self, min: f64, max: f64) -> f64 {
        use rand::Rng;
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Fixed random for testing.
///
/// Integers are clamped into the requested range; floats sit at the midpoint,
/// so learning-parameter drift is zero.
#[cfg(test)]
pub struct FixedRandom(pub i32);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max.max(min))
    }

    fn gen_float(&self, min: f64, max: f64) -> f64 {
        (min + max) / 2.0
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}
