//! External service port traits (LLM, session memory, telemetry).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{LlmError, SessionStoreError};

// =============================================================================
// LLM Types
// =============================================================================

/// LLM request/response types
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The conversation history
    pub messages: Vec<ChatMessage>,
    /// System prompt / context
    pub system_prompt: Option<String>,
    /// Model override; the client default is used when absent
    pub model: Option<String>,
    pub response_format: ResponseFormat,
}

impl LlmRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            system_prompt: None,
            model: None,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Ask the provider for a single JSON object
    pub fn with_json_response(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }
}

/// Output mode requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    #[serde(other)]
    Unknown,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
            MessageRole::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            "system" => MessageRole::System,
            _ => MessageRole::Unknown,
        })
    }
}

/// Response from the LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text content
    pub content: String,
    /// Finish reason
    pub finish_reason: FinishReason,
    /// Token usage
    pub usage: Option<TokenUsage>,
}

/// Reason the generation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    /// Output was cut by the token limit; the caller may ask for more
    Length,
    ContentFilter,
    #[serde(other)]
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

// =============================================================================
// Session Memory
// =============================================================================

/// One stored conversation item of an agent session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryItem {
    pub role: MessageRole,
    pub content: String,
}

impl MemoryItem {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Durable conversation memory, keyed by session id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionMemoryPort: Send + Sync {
    /// All items of a session in insertion order
    async fn load_items(&self, session_id: &str) -> Result<Vec<MemoryItem>, SessionStoreError>;

    async fn append_items(
        &self,
        session_id: &str,
        items: Vec<MemoryItem>,
    ) -> Result<(), SessionStoreError>;

    async fn clear_session(&self, session_id: &str) -> Result<(), SessionStoreError>;
}

// =============================================================================
// Telemetry
// =============================================================================

/// Named timing spans with free-form metadata.
///
/// Spans are keyed by name; starting a name that is already active replaces
/// the active span.
pub trait TelemetryPort: Send + Sync {
    fn start(&self, name: &str, metadata: HashMap<String, String>);
    fn annotate(&self, name: &str, key: &str, value: &str);
    fn stop(&self, name: &str);
}
