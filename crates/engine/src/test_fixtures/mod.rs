//! Shared test doubles for the agent pipeline.
//!
//! `ScriptedLlm` replays canned replies in order and records every request,
//! which keeps service and session tests free of per-call mock expectations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::infrastructure::agent_gateway::{AgentGateway, AgentRegistry};
use crate::infrastructure::ports::{
    FinishReason, LlmError, LlmPort, LlmRequest, LlmResponse,
};
use crate::infrastructure::profiler::NoopTelemetry;
use crate::infrastructure::session::InMemorySessionMemory;
use crate::infrastructure::settings::OpenAiSettings;

/// LLM fake answering from a fixed script
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Full text (system prompt and messages) of the n-th request
    pub fn prompt_text(&self, index: usize) -> String {
        let requests = self.requests.lock().unwrap();
        let request = &requests[index];
        let mut text = request.system_prompt.clone().unwrap_or_default();
        for message in &request.messages {
            text.push('\n');
            text.push_str(&message.content);
        }
        text
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(content) => Ok(LlmResponse {
                content,
                finish_reason: FinishReason::Stop,
                usage: None,
            }),
            None => Err(LlmError::RequestFailed("script exhausted".to_string())),
        }
    }
}

/// LLM fake that always fails
pub struct FailingLlm;

#[async_trait]
impl LlmPort for FailingLlm {
    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
        Err(LlmError::Http {
            status: 503,
            body: "Service Unavailable".to_string(),
        })
    }
}

pub fn test_openai_settings() -> OpenAiSettings {
    OpenAiSettings {
        api_key: "sk-test".to_string(),
        base_url: "http://localhost:9".to_string(),
        scenario_model: "scenario-model".to_string(),
        feedback_model: "feedback-model".to_string(),
        reflection_model: "reflection-model".to_string(),
        referee_model: "referee-model".to_string(),
    }
}

/// Gateway over the given LLM with in-memory session memory
pub fn gateway_with(llm: Arc<dyn LlmPort>) -> (Arc<AgentGateway>, Arc<InMemorySessionMemory>) {
    let memory = Arc::new(InMemorySessionMemory::new());
    let gateway = AgentGateway::new(
        llm,
        memory.clone(),
        AgentRegistry::from_settings(&test_openai_settings()),
        Arc::new(NoopTelemetry),
    );
    (Arc::new(gateway), memory)
}
