//! Training session: the step machine one user walks through.
//!
//! ```text
//! SelectScenario -> Configure -> Chat -> Feedback -> Reflection
//!        |  \-> CustomSetup -> CustomPicker -> Configure
//!        \-> TopicSelect -> Game
//! ```
//!
//! All state for one user lives in [`TrainingSession`], mutated through
//! `&mut self`. Reset replaces it wholesale and hands every conversational
//! agent a fresh memory session.

mod arcade;

use std::fmt;
use std::sync::Arc;

use motstand_domain::catalog::{find_scenario, OPPONENT_NAMES};
use motstand_domain::value_objects::MAX_DRIFT;
use motstand_domain::{
    ChatTurn, Difficulty, DomainError, GameState, LearningParams, ScenarioContext, ScenarioOption,
};

use crate::infrastructure::agent_gateway::AgentRole;
use crate::infrastructure::ports::{pick_index, RandomPort, SessionStoreError};
use crate::infrastructure::session::{AgentSessions, SessionHandle};
use crate::use_cases::sparring::SparringUseCases;
use crate::use_cases::training::{TrainingUseCases, DEFAULT_OPTION_COUNT, MIN_TURNS_FOR_FEEDBACK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    SelectScenario,
    CustomSetup,
    CustomPicker,
    Configure,
    Chat,
    Feedback,
    Reflection,
    TopicSelect,
    Game,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::SelectScenario => "select_scenario",
            Step::CustomSetup => "custom_setup",
            Step::CustomPicker => "custom_picker",
            Step::Configure => "configure",
            Step::Chat => "chat",
            Step::Feedback => "feedback",
            Step::Reflection => "reflection",
            Step::TopicSelect => "topic_select",
            Step::Game => "game",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    /// Required state was missing; the session moved back to this step
    #[error("Nothing to show here, returned to {0}")]
    Rerouted(Step),
}

pub struct TrainingSession {
    training: Arc<TrainingUseCases>,
    sparring: Arc<SparringUseCases>,
    random: Arc<dyn RandomPort>,
    agent_sessions: AgentSessions,
    step: Step,
    context: Option<ScenarioContext>,
    chat_history: Vec<ChatTurn>,
    feedback: Option<String>,
    reflection_history: Vec<ChatTurn>,
    learning_params: LearningParams,
    scenario_options: Vec<ScenarioOption>,
    game: Option<GameState>,
}

impl TrainingSession {
    pub fn new(
        training: Arc<TrainingUseCases>,
        sparring: Arc<SparringUseCases>,
        random: Arc<dyn RandomPort>,
        agent_sessions: AgentSessions,
    ) -> Self {
        Self {
            training,
            sparring,
            random,
            agent_sessions,
            step: Step::SelectScenario,
            context: None,
            chat_history: Vec::new(),
            feedback: None,
            reflection_history: Vec::new(),
            learning_params: LearningParams::new(),
            scenario_options: Vec::new(),
            game: None,
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn context(&self) -> Option<&ScenarioContext> {
        self.context.as_ref()
    }

    pub fn chat_history(&self) -> &[ChatTurn] {
        &self.chat_history
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn reflection_history(&self) -> &[ChatTurn] {
        &self.reflection_history
    }

    pub fn learning_params(&self) -> LearningParams {
        self.learning_params
    }

    pub fn scenario_options(&self) -> &[ScenarioOption] {
        &self.scenario_options
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn agent_session(&self, role: AgentRole) -> Option<&SessionHandle> {
        self.agent_sessions.get(role)
    }

    // =========================================================================
    // State primitives
    // =========================================================================

    /// Replace the active scenario
    pub fn set_context(&mut self, context: ScenarioContext) {
        self.context = Some(context);
    }

    /// Record a turn and advance the learning parameters with it
    pub fn append_chat_turn(&mut self, turn: ChatTurn) {
        self.chat_history.push(turn);
        let random = self.random.clone();
        self.learning_params = self
            .learning_params
            .advanced(|| random.gen_float(-MAX_DRIFT, MAX_DRIFT));
    }

    /// Leave the chat for feedback, whatever the transcript length
    pub fn complete_scenario(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::Chat, "complete the scenario")?;
        self.step = Step::Feedback;
        tracing::info!(turns = self.chat_history.len(), "Scenario completed");
        Ok(())
    }

    /// Route back to an entry step when the current step lacks its state.
    ///
    /// Returns the step the session ends up on.
    pub fn ensure_consistent(&mut self) -> Step {
        let fallback = match self.step {
            Step::CustomPicker if self.context.is_none() || self.scenario_options.is_empty() => {
                Some(Step::CustomSetup)
            }
            Step::Configure | Step::Chat | Step::Feedback | Step::Reflection
                if self.context.is_none() =>
            {
                Some(Step::SelectScenario)
            }
            Step::Game if self.game.is_none() => Some(Step::TopicSelect),
            _ => None,
        };
        if let Some(step) = fallback {
            tracing::debug!(from = %self.step, to = %step, "Missing state, rerouting");
            self.step = step;
        }
        self.step
    }

    fn expect_step(&self, expected: Step, action: &str) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(DomainError::invalid_state_transition(format!(
                "cannot {} from step {}",
                action, self.step
            ))
            .into())
        }
    }

    /// Check the step and that it has its required state
    fn enter(&mut self, expected: Step, action: &str) -> Result<(), SessionError> {
        self.expect_step(expected, action)?;
        let step = self.ensure_consistent();
        if step != expected {
            return Err(SessionError::Rerouted(step));
        }
        Ok(())
    }

    fn active_context(&self) -> Result<ScenarioContext, SessionError> {
        self.context
            .clone()
            .ok_or(SessionError::Rerouted(Step::SelectScenario))
    }

    fn session_for(&self, role: AgentRole) -> Result<SessionHandle, SessionError> {
        self.agent_sessions
            .get(role)
            .cloned()
            .ok_or_else(|| DomainError::not_found("AgentSession", role.as_str()).into())
    }

    // =========================================================================
    // Scenario selection
    // =========================================================================

    pub fn select_prebuilt(&mut self, scenario_id: &str) -> Result<(), SessionError> {
        self.expect_step(Step::SelectScenario, "select a scenario")?;
        let scenario = find_scenario(scenario_id)
            .ok_or_else(|| DomainError::not_found("Scenario", scenario_id))?;
        self.set_context(scenario.to_context());
        self.step = Step::Configure;
        tracing::info!(scenario = scenario.id, "Prebuilt scenario selected");
        Ok(())
    }

    pub fn begin_custom(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::SelectScenario, "start a custom scenario")?;
        self.step = Step::CustomSetup;
        Ok(())
    }

    /// Validate the custom form and ask the planner for variants
    pub async fn submit_custom(
        &mut self,
        role: &str,
        situation: &str,
        goal: &str,
    ) -> Result<(), SessionError> {
        self.expect_step(Step::CustomSetup, "submit a custom scenario")?;
        let context = ScenarioContext::custom(role, situation, goal)?;

        let options = self
            .training
            .planner
            .generate_options(&context, DEFAULT_OPTION_COUNT)
            .await;

        tracing::info!(options = options.len(), "Custom scenario planned");
        self.set_context(context);
        self.scenario_options = options;
        self.step = Step::CustomPicker;
        Ok(())
    }

    /// Merge the chosen planner variant into the context
    pub fn choose_option(&mut self, option_id: &str) -> Result<(), SessionError> {
        self.enter(Step::CustomPicker, "choose a scenario variant")?;
        let option = self
            .scenario_options
            .iter()
            .find(|o| o.id == option_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("ScenarioOption", option_id))?;

        let opponent = match option.opponent_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => OPPONENT_NAMES[pick_index(self.random.as_ref(), OPPONENT_NAMES.len())].to_string(),
        };

        let context = self
            .context
            .as_mut()
            .ok_or(SessionError::Rerouted(Step::CustomSetup))?;
        context.apply_details(&option, opponent);
        self.step = Step::Configure;
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SessionError> {
        self.enter(Step::Configure, "change difficulty")?;
        if let Some(context) = self.context.as_mut() {
            context.difficulty = difficulty;
        }
        Ok(())
    }

    /// Step back from a setup screen
    pub fn go_back(&mut self) -> Result<Step, SessionError> {
        let previous = match self.step {
            Step::CustomSetup | Step::Configure | Step::TopicSelect => Step::SelectScenario,
            Step::CustomPicker => Step::CustomSetup,
            step => {
                return Err(DomainError::invalid_state_transition(format!(
                    "no way back from step {}",
                    step
                ))
                .into())
            }
        };
        self.step = previous;
        Ok(previous)
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Fresh scenario memory and transcript, then into the chat
    pub async fn start_training(&mut self) -> Result<(), SessionError> {
        self.enter(Step::Configure, "start training")?;
        self.agent_sessions.replace(AgentRole::Scenario).await?;
        self.chat_history.clear();
        self.feedback = None;
        self.reflection_history.clear();
        self.scenario_options.clear();
        self.step = Step::Chat;
        tracing::info!("Training started");
        Ok(())
    }

    /// Ask for the opponent's opening line if the chat is empty
    pub async fn open_chat(&mut self) -> Result<(), SessionError> {
        self.enter(Step::Chat, "open the chat")?;
        if !self.chat_history.is_empty() {
            return Ok(());
        }
        let context = self.active_context()?;
        let session = self.session_for(AgentRole::Scenario)?;

        let intro = self
            .training
            .roleplay
            .start(&context, &self.learning_params, &session)
            .await;
        self.append_chat_turn(ChatTurn::opening(intro));
        Ok(())
    }

    /// Send a user message and return the opponent's reply
    pub async fn send_chat_message(&mut self, text: &str) -> Result<String, SessionError> {
        self.enter(Step::Chat, "send a chat message")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("message cannot be empty").into());
        }
        let context = self.active_context()?;
        let session = self.session_for(AgentRole::Scenario)?;

        let reply = self
            .training
            .roleplay
            .reply(&context, &self.learning_params, text, &session)
            .await;
        self.append_chat_turn(ChatTurn::new(text, reply.clone()));
        Ok(reply)
    }

    // =========================================================================
    // Feedback and reflection
    // =========================================================================

    /// Generate feedback once; later calls return the cached text
    pub async fn load_feedback(&mut self) -> Result<String, SessionError> {
        self.enter(Step::Feedback, "load feedback")?;
        if let Some(feedback) = &self.feedback {
            return Ok(feedback.clone());
        }
        let context = self.active_context()?;
        let session = self.agent_sessions.replace(AgentRole::Feedback).await?;

        let feedback = self
            .training
            .feedback
            .generate(&context, &self.chat_history, &session)
            .await;
        self.feedback = Some(feedback.clone());
        Ok(feedback)
    }

    pub async fn start_reflection(&mut self) -> Result<(), SessionError> {
        self.enter(Step::Feedback, "start reflection")?;
        self.agent_sessions.replace(AgentRole::Reflection).await?;
        self.reflection_history.clear();
        self.step = Step::Reflection;
        Ok(())
    }

    /// Ask the opening reflection question once
    pub async fn open_reflection(&mut self) -> Result<(), SessionError> {
        self.enter(Step::Reflection, "open reflection")?;
        if !self.reflection_history.is_empty() {
            return Ok(());
        }
        let context = self.active_context()?;
        let session = self.session_for(AgentRole::Reflection)?;
        let skipped = self.chat_history.len() < MIN_TURNS_FOR_FEEDBACK;

        let question = self
            .training
            .reflection
            .start(&context, &session, skipped)
            .await;
        self.reflection_history.push(ChatTurn::opening(question));
        Ok(())
    }

    pub async fn send_reflection_message(&mut self, text: &str) -> Result<String, SessionError> {
        self.enter(Step::Reflection, "send a reflection")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("reflection cannot be empty").into());
        }
        let context = self.active_context()?;
        let session = self.session_for(AgentRole::Reflection)?;

        let reply = self
            .training
            .reflection
            .reply(&context, text, &session)
            .await;
        self.reflection_history.push(ChatTurn::new(text, reply.clone()));
        Ok(reply)
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Discard everything and return to scenario selection
    pub async fn reset_for_new_scenario(&mut self) -> Result<(), SessionError> {
        self.step = Step::SelectScenario;
        self.context = None;
        self.chat_history.clear();
        self.feedback = None;
        self.reflection_history.clear();
        self.learning_params = LearningParams::new();
        self.scenario_options.clear();
        self.game = None;
        self.agent_sessions.reset_all().await?;
        tracing::info!("Session reset");
        Ok(())
    }

    pub async fn finish(&mut self) -> Result<(), SessionError> {
        self.reset_for_new_scenario().await
    }
}
