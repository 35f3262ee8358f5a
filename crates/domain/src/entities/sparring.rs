//! Sparring entities - the verbal arcade mode
//!
//! A [`SparringTopic`] is picked from the catalog. For each level number an
//! opponent ([`SparringLevel`]) is generated, then a batch of
//! [`SparringRound`]s, each offering exactly [`ROUND_OPTION_COUNT`] answers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::StartingHitPoints;

/// Every round offers exactly this many answers
pub const ROUND_OPTION_COUNT: usize = 4;

/// Immutable catalog entry for arcade mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparringTopic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl SparringTopic {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
        }
    }
}

/// Generated opponent profile for one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparringLevel {
    pub id: String,
    pub title: String,
    pub opponent_name: String,
    pub opponent_role: String,
    pub attack_style: String,
    pub weakness: String,
    pub win_condition: String,
    /// Behaviour instructions for the agent impersonating the opponent
    pub opponent_instructions: String,
    pub initial_player_hp: i32,
    pub initial_opponent_hp: i32,
    pub avatar: String,
}

impl SparringLevel {
    pub fn starting_hit_points(&self) -> StartingHitPoints {
        StartingHitPoints {
            player: self.initial_player_hp,
            opponent: self.initial_opponent_hp,
        }
    }
}

/// Severity class of an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Defensive, apologetic or aggressive - the player takes heavy damage
    CriticalFail,
    /// Passive or vague - the player takes some damage
    Weak,
    /// Clear boundary or fact check - the opponent takes some damage
    Good,
    /// Perfect counter aimed at the weakness - the opponent takes heavy damage
    CriticalHit,
}

impl OptionKind {
    pub fn all() -> &'static [OptionKind] {
        &[
            OptionKind::CriticalFail,
            OptionKind::Weak,
            OptionKind::Good,
            OptionKind::CriticalHit,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::CriticalFail => "critical_fail",
            OptionKind::Weak => "weak",
            OptionKind::Good => "good",
            OptionKind::CriticalHit => "critical_hit",
        }
    }

    /// Headline shown after the answer is picked
    pub fn verdict(&self) -> &'static str {
        match self {
            OptionKind::CriticalHit => "CRITICAL HIT!",
            OptionKind::Good => "Godt svar!",
            OptionKind::Weak => "Svakt...",
            OptionKind::CriticalFail => "AU! Den svei.",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OptionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical_fail" => Ok(OptionKind::CriticalFail),
            "weak" => Ok(OptionKind::Weak),
            "good" => Ok(OptionKind::Good),
            "critical_hit" => Ok(OptionKind::CriticalHit),
            _ => Err(DomainError::parse(format!("Unknown option kind: {}", s))),
        }
    }
}

/// One candidate answer in a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparringOption {
    pub text: String,
    pub damage_user: u32,
    pub damage_opponent: u32,
    pub feedback: String,
    pub kind: OptionKind,
}

impl SparringOption {
    pub fn new(
        text: impl Into<String>,
        damage_user: u32,
        damage_opponent: u32,
        feedback: impl Into<String>,
        kind: OptionKind,
    ) -> Self {
        Self {
            text: text.into(),
            damage_user,
            damage_opponent,
            feedback: feedback.into(),
            kind,
        }
    }
}

/// One encounter: scene, the opponent's attack and four answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparringRound {
    context: String,
    attack: String,
    options: Vec<SparringOption>,
}

impl SparringRound {
    /// Build a round. Fails unless exactly four options are given.
    pub fn new(
        context: impl Into<String>,
        attack: impl Into<String>,
        options: Vec<SparringOption>,
    ) -> Result<Self, DomainError> {
        if options.len() != ROUND_OPTION_COUNT {
            return Err(DomainError::validation(format!(
                "A round needs exactly {} options, got {}",
                ROUND_OPTION_COUNT,
                options.len()
            )));
        }

        Ok(Self {
            context: context.into(),
            attack: attack.into(),
            options,
        })
    }

    /// Infallible constructor for a fixed set of options
    pub fn from_options(
        context: impl Into<String>,
        attack: impl Into<String>,
        options: [SparringOption; ROUND_OPTION_COUNT],
    ) -> Self {
        Self {
            context: context.into(),
            attack: attack.into(),
            options: options.into(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn attack(&self) -> &str {
        &self.attack
    }

    pub fn options(&self) -> &[SparringOption] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&SparringOption> {
        self.options.get(index)
    }

    /// Copy of this round in a different scene
    pub fn with_context(&self, context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            attack: self.attack.clone(),
            options: self.options.clone(),
        }
    }

    /// Whether each severity class appears exactly once
    pub fn covers_every_kind(&self) -> bool {
        OptionKind::all()
            .iter()
            .all(|kind| self.options.iter().filter(|o| o.kind == *kind).count() == 1)
    }

    /// Fisher-Yates shuffle of the options.
    ///
    /// `pick(n)` must return an index in `0..n`; out-of-range values are
    /// wrapped.
    pub fn shuffle_options(&mut self, mut pick: impl FnMut(usize) -> usize) {
        for i in (1..self.options.len()).rev() {
            let j = pick(i + 1) % (i + 1);
            self.options.swap(i, j);
        }
    }
}
