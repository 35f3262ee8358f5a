//! Difficulty tier for scenario rehearsal
//!
//! The tier shapes how the roleplay opponent behaves:
//! - Easy: cooperative, accepts reasonable explanations quickly
//! - Medium: skeptical, needs clear arguments (default)
//! - Hard: obstinate, emotional, interrupts

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// All tiers in ascending order, for selectors
    pub fn all() -> &'static [Difficulty] {
        &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Norwegian label shown next to the selector
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Lett",
            Difficulty::Medium => "Middels",
            Difficulty::Hard => "Vanskelig",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "lett" => Ok(Difficulty::Easy),
            "medium" | "middels" => Ok(Difficulty::Medium),
            "hard" | "vanskelig" => Ok(Difficulty::Hard),
            _ => Err(DomainError::parse(format!("Unknown difficulty: {}", s))),
        }
    }
}
