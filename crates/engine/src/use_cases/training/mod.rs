//! Conversational services for the resistance-training flow.
//!
//! Each service composes a prompt from the scenario context and transcript,
//! runs it through the agent gateway, and recovers from any failure with a
//! fixed line so the session never sees a raw error.

mod feedback;
mod planner;
mod reflection;
mod roleplay;

use std::sync::Arc;

use crate::infrastructure::agent_gateway::AgentGateway;

pub use feedback::{
    feedback_prompt, FeedbackWriter, FEEDBACK_TURN_BUDGET, FEEDBACK_UNAVAILABLE,
    MIN_TURNS_FOR_FEEDBACK, TOO_SHORT_FOR_FEEDBACK,
};
pub use planner::{
    fallback_option, parse_options, planner_prompt, ScenarioPlanner, DEFAULT_OPTION_COUNT,
};
pub use reflection::{opening_prompt, ReflectionGuide, REFLECTION_UNAVAILABLE};
pub use roleplay::{roleplay_prompt, Roleplay, ROLEPLAY_UNAVAILABLE};

/// Container for training use cases.
pub struct TrainingUseCases {
    pub roleplay: Arc<Roleplay>,
    pub feedback: Arc<FeedbackWriter>,
    pub reflection: Arc<ReflectionGuide>,
    pub planner: Arc<ScenarioPlanner>,
}

impl TrainingUseCases {
    pub fn new(gateway: Arc<AgentGateway>) -> Self {
        Self {
            roleplay: Arc::new(Roleplay::new(gateway.clone())),
            feedback: Arc::new(FeedbackWriter::new(gateway.clone())),
            reflection: Arc::new(ReflectionGuide::new(gateway.clone())),
            planner: Arc::new(ScenarioPlanner::new(gateway)),
        }
    }
}
