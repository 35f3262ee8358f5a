//! Chat turns for the scenario and reflection transcripts

use serde::{Deserialize, Serialize};

/// Single exchange in a transcript.
///
/// An empty `user` field marks a line the agent opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

impl ChatTurn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }

    /// Agent-initiated opening line
    pub fn opening(assistant: impl Into<String>) -> Self {
        Self::new(String::new(), assistant)
    }

    pub fn is_opening(&self) -> bool {
        self.user.is_empty()
    }
}

/// Render a transcript the way the feedback prompt expects it.
pub fn transcript_lines(history: &[ChatTurn], user_label: &str, assistant_label: &str) -> String {
    history
        .iter()
        .flat_map(|turn| {
            [
                format!("{}: {}", user_label, turn.user),
                format!("{}: {}", assistant_label, turn.assistant),
            ]
        })
        .collect::<Vec<_>>()
        .join("\n")
}
