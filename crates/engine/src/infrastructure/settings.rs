//! Process configuration read from environment variables.
//!
//! `.env` is loaded by `main` before [`Settings::from_env`] runs; lookups are
//! injectable so parsing is tested without touching the process environment.

use crate::infrastructure::openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::infrastructure::resilient_llm::RetryConfig;
use motstand_domain::DEFAULT_ROUNDS_PER_LEVEL;

/// Default SQLite file for agent session memory.
pub const DEFAULT_SESSION_DB: &str = "sessions.db";

/// `SESSION_DB` value selecting the in-memory store.
pub const IN_MEMORY_SESSION_DB: &str = ":memory:";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Provider endpoint and per-agent model names
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub scenario_model: String,
    pub feedback_model: String,
    pub reflection_model: String,
    pub referee_model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionDb {
    Sqlite(String),
    InMemory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparringSettings {
    /// Rounds generated per level
    pub rounds_per_level: usize,
    /// Generate a level's rounds in one request instead of one request per round
    pub batch_rounds: bool,
}

impl Default for SparringSettings {
    fn default() -> Self {
        Self {
            rounds_per_level: DEFAULT_ROUNDS_PER_LEVEL,
            batch_rounds: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub session_db: SessionDb,
    pub retry: RetryConfig,
    pub sparring: SparringSettings,
    /// Record agent spans with the profiler instead of discarding them
    pub profile_agents: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let model = |key: &str| get(key).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let openai = OpenAiSettings {
            api_key,
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            scenario_model: model("SCENARIO_AGENT_MODEL"),
            feedback_model: model("FEEDBACK_AGENT_MODEL"),
            reflection_model: model("REFLECTION_AGENT_MODEL"),
            referee_model: model("REFEREE_AGENT_MODEL"),
        };

        let session_db = match get("SESSION_DB") {
            Some(path) if path == IN_MEMORY_SESSION_DB => SessionDb::InMemory,
            Some(path) => SessionDb::Sqlite(path),
            None => SessionDb::Sqlite(DEFAULT_SESSION_DB.to_string()),
        };

        let mut retry = RetryConfig::default();
        if let Some(raw) = get("LLM_MAX_RETRIES") {
            retry.max_retries = parse_number("LLM_MAX_RETRIES", &raw)?;
        }

        let mut sparring = SparringSettings::default();
        if let Some(raw) = get("SPARRING_ROUNDS_PER_LEVEL") {
            let rounds: usize = parse_number("SPARRING_ROUNDS_PER_LEVEL", &raw)?;
            if rounds == 0 {
                return Err(ConfigError::Invalid {
                    key: "SPARRING_ROUNDS_PER_LEVEL",
                    value: raw,
                });
            }
            sparring.rounds_per_level = rounds;
        }
        if let Some(raw) = get("SPARRING_BATCH_ROUNDS") {
            sparring.batch_rounds = parse_flag("SPARRING_BATCH_ROUNDS", &raw)?;
        }

        let profile_agents = match get("PROFILE_AGENTS") {
            Some(raw) => parse_flag("PROFILE_AGENTS", &raw)?,
            None => false,
        };

        Ok(Self {
            openai,
            session_db,
            retry,
            sparring,
            profile_agents,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let settings = settings_with(&[("OPENAI_API_KEY", "sk-test")]).unwrap();

        assert_eq!(settings.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(settings.openai.scenario_model, "gpt-5-nano");
        assert_eq!(settings.openai.referee_model, "gpt-5-nano");
        assert_eq!(settings.session_db, SessionDb::Sqlite("sessions.db".into()));
        assert_eq!(settings.retry, RetryConfig::default());
        assert_eq!(settings.sparring.rounds_per_level, 5);
        assert!(settings.sparring.batch_rounds);
        assert!(!settings.profile_agents);
    }

    #[test]
    fn test_missing_api_key_is_error() {
        assert_eq!(
            settings_with(&[("OPENAI_API_KEY", "  ")]),
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        );
    }

    #[test]
    fn test_overrides() {
        let settings = settings_with(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080"),
            ("FEEDBACK_AGENT_MODEL", "gpt-5-mini"),
            ("SESSION_DB", ":memory:"),
            ("LLM_MAX_RETRIES", "0"),
            ("SPARRING_ROUNDS_PER_LEVEL", "3"),
            ("SPARRING_BATCH_ROUNDS", "false"),
            ("PROFILE_AGENTS", "yes"),
        ])
        .unwrap();

        assert_eq!(settings.openai.base_url, "http://localhost:8080");
        assert_eq!(settings.openai.feedback_model, "gpt-5-mini");
        assert_eq!(settings.openai.reflection_model, "gpt-5-nano");
        assert_eq!(settings.session_db, SessionDb::InMemory);
        assert_eq!(settings.retry.max_retries, 0);
        assert_eq!(settings.sparring.rounds_per_level, 3);
        assert!(!settings.sparring.batch_rounds);
        assert!(settings.profile_agents);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(matches!(
            settings_with(&[("OPENAI_API_KEY", "k"), ("LLM_MAX_RETRIES", "many")]),
            Err(ConfigError::Invalid { key: "LLM_MAX_RETRIES", .. })
        ));
        assert!(matches!(
            settings_with(&[("OPENAI_API_KEY", "k"), ("SPARRING_ROUNDS_PER_LEVEL", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            settings_with(&[("OPENAI_API_KEY", "k"), ("SPARRING_BATCH_ROUNDS", "kanskje")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
