//! Scenario entities - what the user rehearses
//!
//! A [`ScenarioContext`] is the single active rehearsal setup. It is created
//! from a catalog [`Scenario`] or from the custom form, enriched with a
//! planner [`ScenarioOption`], and replaced wholesale on reset.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Difficulty;

/// The scenario the user wants to rehearse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContext {
    pub role: String,
    pub situation: String,
    pub goal: String,
    pub scenario_title: Option<String>,
    pub scenario_summary: Option<String>,
    /// Persona instructions for the opponent agent
    pub agent_instructions: Option<String>,
    pub opponent_name: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub avatar_path: Option<String>,
}

impl ScenarioContext {
    /// Build a context from the custom form. All three fields must be non-blank.
    pub fn custom(
        role: impl Into<String>,
        situation: impl Into<String>,
        goal: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let role = role.into();
        let situation = situation.into();
        let goal = goal.into();

        for (field, value) in [("role", &role), ("situation", &situation), ("goal", &goal)] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{} cannot be empty", field)));
            }
        }

        Ok(Self::new(role, situation, goal))
    }

    pub fn new(
        role: impl Into<String>,
        situation: impl Into<String>,
        goal: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            situation: situation.into(),
            goal: goal.into(),
            scenario_title: None,
            scenario_summary: None,
            agent_instructions: None,
            opponent_name: None,
            difficulty: Difficulty::default(),
            avatar_path: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.scenario_title = Some(title.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.scenario_summary = Some(summary.into());
        self
    }

    pub fn with_agent_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.agent_instructions = Some(instructions.into());
        self
    }

    pub fn with_opponent(mut self, name: impl Into<String>) -> Self {
        self.opponent_name = Some(name.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_avatar(mut self, path: impl Into<String>) -> Self {
        self.avatar_path = Some(path.into());
        self
    }

    /// Merge generated scenario metadata into the context.
    ///
    /// Difficulty goes back to the default and the avatar is cleared, since
    /// the chosen variant describes a new opponent.
    pub fn apply_details(&mut self, option: &ScenarioOption, opponent_name: impl Into<String>) {
        self.scenario_title = Some(option.title.clone());
        self.scenario_summary = Some(option.summary.clone());
        self.agent_instructions = Some(option.agent_instructions.clone());
        self.opponent_name = Some(opponent_name.into());
        self.difficulty = Difficulty::default();
        self.avatar_path = None;
    }

    /// Name used in prompts and headers when the opponent is unnamed
    pub fn opponent_label(&self) -> &str {
        self.opponent_name.as_deref().unwrap_or("Motstandstrener")
    }
}

/// A prebuilt rehearsal scenario from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub summary: &'static str,
    pub role: &'static str,
    pub situation: &'static str,
    pub goal: &'static str,
    /// Persona instructions specific to this scenario
    pub difficulty_modifier: &'static str,
    /// Fixed opponent name, never randomized
    pub opponent_name: &'static str,
    pub icon: &'static str,
    pub avatar_path: Option<&'static str>,
}

impl Scenario {
    /// Build the active context for this catalog entry
    pub fn to_context(&self) -> ScenarioContext {
        let context = ScenarioContext::new(self.role, self.situation, self.goal)
            .with_title(self.title)
            .with_summary(self.summary)
            .with_agent_instructions(self.difficulty_modifier)
            .with_opponent(self.opponent_name);

        match self.avatar_path {
            Some(path) => context.with_avatar(path),
            None => context,
        }
    }
}

/// A scenario variant suggested by the planner agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOption {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub focus: String,
    pub agent_instructions: String,
    #[serde(default)]
    pub opponent_name: Option<String>,
}
