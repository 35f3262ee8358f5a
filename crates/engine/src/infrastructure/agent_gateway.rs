//! Agent gateway: run a named agent against the LLM port
//!
//! An agent is a model name plus base instructions. Conversational agents
//! read and extend their session memory on every run; structured agents
//! answer a single JSON-mode request with no memory.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::infrastructure::ports::{
    ChatMessage, FinishReason, LlmError, LlmPort, LlmRequest, MemoryItem, MessageRole,
    SessionMemoryPort, SessionStoreError, TelemetryPort,
};
use crate::infrastructure::session::SessionHandle;
use crate::infrastructure::settings::OpenAiSettings;

/// Default number of model calls one agent run may make.
pub const DEFAULT_TURN_BUDGET: u32 = 6;

/// Follow-up sent when a response was cut off by the length limit.
const CONTINUE_PROMPT: &str = "Fortsett.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Scenario,
    Feedback,
    Reflection,
    ScenarioPlanner,
    Referee,
}

impl AgentRole {
    pub fn all() -> &'static [AgentRole] {
        &[
            AgentRole::Scenario,
            AgentRole::Feedback,
            AgentRole::Reflection,
            AgentRole::ScenarioPlanner,
            AgentRole::Referee,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Scenario => "scenario",
            AgentRole::Feedback => "feedback",
            AgentRole::Reflection => "reflection",
            AgentRole::ScenarioPlanner => "scenario_planner",
            AgentRole::Referee => "referee",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AgentError::UnknownAgent(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Memory(#[from] SessionStoreError),
    #[error("Agent {agent} exceeded its turn budget of {budget}")]
    MaxTurnsExceeded { agent: AgentRole, budget: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub model: String,
    pub instructions: String,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instructions: instructions.into(),
        }
    }
}

/// Agent configurations by role
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentRole, AgentConfig>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, role: AgentRole, config: AgentConfig) -> Self {
        self.agents.insert(role, config);
        self
    }

    /// Every agent the trainer uses, with models from settings
    pub fn from_settings(settings: &OpenAiSettings) -> Self {
        Self::new()
            .with_agent(
                AgentRole::Scenario,
                AgentConfig::new(
                    &settings.scenario_model,
                    "Du er en direkte, men respektfull motpart i en krevende samtale.",
                ),
            )
            .with_agent(
                AgentRole::Feedback,
                AgentConfig::new(
                    &settings.feedback_model,
                    "Du skriver korte, støttende observasjoner i punktform.",
                ),
            )
            .with_agent(
                AgentRole::Reflection,
                AgentConfig::new(
                    &settings.reflection_model,
                    "Du leder en rolig refleksjonssamtale og stiller ett spørsmål av gangen.",
                ),
            )
            .with_agent(
                AgentRole::ScenarioPlanner,
                AgentConfig::new(
                    &settings.scenario_model,
                    "Du designer korte scenarioforslag i JSON for motstandstrening.",
                ),
            )
            .with_agent(
                AgentRole::Referee,
                AgentConfig::new(
                    &settings.referee_model,
                    "Du er en streng men rettferdig dommer i en verbal boksekamp. Du svarer ALLTID med gyldig JSON.",
                ),
            )
    }

    pub fn get(&self, role: AgentRole) -> Result<&AgentConfig, AgentError> {
        self.agents
            .get(&role)
            .ok_or_else(|| AgentError::UnknownAgent(role.as_str().to_string()))
    }
}

pub struct AgentGateway {
    llm: Arc<dyn LlmPort>,
    memory: Arc<dyn SessionMemoryPort>,
    registry: AgentRegistry,
    telemetry: Arc<dyn TelemetryPort>,
}

impl AgentGateway {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        memory: Arc<dyn SessionMemoryPort>,
        registry: AgentRegistry,
        telemetry: Arc<dyn TelemetryPort>,
    ) -> Self {
        Self {
            llm,
            memory,
            registry,
            telemetry,
        }
    }

    /// Run a conversational agent and return its trimmed text output.
    ///
    /// With a session handle, stored items are replayed before `input` and the
    /// exchange is appended afterwards.
    pub async fn run(
        &self,
        role: AgentRole,
        input: &str,
        session: Option<&SessionHandle>,
        turn_budget: u32,
    ) -> Result<String, AgentError> {
        let config = self.registry.get(role)?;
        let span = span_name(role);
        self.telemetry.start(&span, span_metadata(config, session));

        let result = self.run_turns(role, config, input, session, turn_budget).await;

        self.telemetry
            .annotate(&span, "outcome", if result.is_ok() { "ok" } else { "error" });
        self.telemetry.stop(&span);

        if let Err(e) = &result {
            tracing::warn!(agent = %role, error = %e, "Agent run failed");
        }
        result
    }

    /// Single JSON-mode request with no session memory
    pub async fn run_structured(
        &self,
        role: AgentRole,
        system_prompt: &str,
        user_prompt: Option<&str>,
    ) -> Result<String, AgentError> {
        let config = self.registry.get(role)?;
        let span = span_name(role);
        self.telemetry.start(&span, span_metadata(config, None));

        let messages = user_prompt.map(ChatMessage::user).into_iter().collect();
        let request = LlmRequest::new(messages)
            .with_system_prompt(format!("{}\n\n{}", config.instructions, system_prompt))
            .with_model(config.model.clone())
            .with_json_response();

        let result = self
            .llm
            .generate(request)
            .await
            .map(|response| response.content.trim().to_string())
            .map_err(AgentError::from);

        self.telemetry
            .annotate(&span, "outcome", if result.is_ok() { "ok" } else { "error" });
        self.telemetry.stop(&span);

        if let Err(e) = &result {
            tracing::warn!(agent = %role, error = %e, "Structured agent run failed");
        }
        result
    }

    async fn run_turns(
        &self,
        role: AgentRole,
        config: &AgentConfig,
        input: &str,
        session: Option<&SessionHandle>,
        turn_budget: u32,
    ) -> Result<String, AgentError> {
        if turn_budget == 0 {
            return Err(AgentError::MaxTurnsExceeded {
                agent: role,
                budget: turn_budget,
            });
        }

        let mut messages: Vec<ChatMessage> = match session {
            Some(handle) => self
                .memory
                .load_items(handle.id())
                .await?
                .iter()
                .map(MemoryItem::to_message)
                .collect(),
            None => Vec::new(),
        };
        messages.push(ChatMessage::user(input));

        let mut output = String::new();
        for turn in 1..=turn_budget {
            let request = LlmRequest::new(messages.clone())
                .with_system_prompt(config.instructions.clone())
                .with_model(config.model.clone());
            let response = self.llm.generate(request).await?;
            output.push_str(&response.content);

            if response.finish_reason != FinishReason::Length {
                tracing::debug!(agent = %role, turns = turn, "Agent run complete");
                let output = output.trim().to_string();
                if let Some(handle) = session {
                    self.memory
                        .append_items(
                            handle.id(),
                            vec![
                                MemoryItem::new(MessageRole::User, input),
                                MemoryItem::new(MessageRole::Assistant, output.clone()),
                            ],
                        )
                        .await?;
                }
                return Ok(output);
            }

            messages.push(ChatMessage::assistant(response.content));
            messages.push(ChatMessage::user(CONTINUE_PROMPT));
        }

        Err(AgentError::MaxTurnsExceeded {
            agent: role,
            budget: turn_budget,
        })
    }
}

fn span_name(role: AgentRole) -> String {
    format!("Agent: {}", role)
}

fn span_metadata(config: &AgentConfig, session: Option<&SessionHandle>) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("model".to_string(), config.model.clone());
    if let Some(handle) = session {
        metadata.insert("session".to_string(), handle.id().to_string());
    }
    metadata
}
