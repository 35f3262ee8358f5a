//! Scenario planner: turns a custom setup into selectable scenario variants.

use std::sync::Arc;

use serde_json::Value;

use motstand_domain::{ScenarioContext, ScenarioOption};

use crate::infrastructure::agent_gateway::{AgentGateway, AgentRole, DEFAULT_TURN_BUDGET};
use crate::use_cases::json::extract_json;

/// Suggestions requested per custom scenario.
pub const DEFAULT_OPTION_COUNT: usize = 3;

pub fn planner_prompt(context: &ScenarioContext, count: usize) -> String {
    format!(
        r#"Du designer scenarioer for en motstandstrener og skal gi JSON.

Rolle: {role}
Situasjon: {situation}
Treningsmål: {goal}

Lag {count} forslag på norsk. Returner JSON som:
{{
  "scenarios": [
    {{
      "id": "kort-id",
      "title": "Kort tittel",
      "summary": "2-3 setninger om situasjonen",
      "focus": "Hva brukeren bør øve på",
      "agent_instructions": "Hvordan motpart-agenten skal opptre (tone, rolle, hva de ønsker å oppnå, hvordan de presser brukeren)",
      "opponent_name": "Et kort norsk navn du vil bruke for motparten (f.eks. Reidar, Ingrid, Amar)"
    }}
  ]
}}
Ingen annen tekst enn JSON."#,
        role = context.role,
        situation = context.situation,
        goal = context.goal,
        count = count,
    )
}

/// The single suggestion offered when the planner produced nothing usable
pub fn fallback_option() -> ScenarioOption {
    ScenarioOption {
        id: "fallback-1".to_string(),
        title: "Samtale med motpart som presser på tid".to_string(),
        summary: "Motparten krever raske beslutninger og stiller spørsmål ved prioriteringene dine."
            .to_string(),
        focus: "Stå i presset og kommunisere tydelige prioriteringer.".to_string(),
        agent_instructions:
            "Du er en kollega som presser på for raske svar og setter spørsmålstegn ved planene."
                .to_string(),
        opponent_name: Some("Reidar".to_string()),
    }
}

/// Text of a scalar field; strings as-is, numbers and booleans rendered
fn field_text(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn option_from_item(item: &Value) -> Option<ScenarioOption> {
    Some(ScenarioOption {
        id: field_text(item, "id")?,
        title: field_text(item, "title")?,
        summary: field_text(item, "summary")?,
        focus: field_text(item, "focus").unwrap_or_default(),
        agent_instructions: field_text(item, "agent_instructions")?,
        opponent_name: field_text(item, "opponent_name").filter(|n| !n.trim().is_empty()),
    })
}

/// Parse planner output into options.
///
/// The outermost `{...}` span is parsed, so prose on either side is ignored.
/// Items missing a required field are skipped; numeric ids are kept as text.
/// Anything that is not a `{"scenarios": [...]}` object yields an empty list.
pub fn parse_options(raw: &str) -> Vec<ScenarioOption> {
    let text = raw.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let payload: Value = match serde_json::from_str(extract_json(text)) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Planner output is not JSON");
            return Vec::new();
        }
    };

    let Some(items) = payload.get("scenarios").and_then(Value::as_array) else {
        return Vec::new();
    };

    items.iter().filter_map(option_from_item).collect()
}

pub struct ScenarioPlanner {
    gateway: Arc<AgentGateway>,
}

impl ScenarioPlanner {
    pub fn new(gateway: Arc<AgentGateway>) -> Self {
        Self { gateway }
    }

    /// Between one and `count` suggestions; never empty
    pub async fn generate_options(
        &self,
        context: &ScenarioContext,
        count: usize,
    ) -> Vec<ScenarioOption> {
        let prompt = planner_prompt(context, count);
        let raw = match self
            .gateway
            .run(AgentRole::ScenarioPlanner, &prompt, None, DEFAULT_TURN_BUDGET)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Scenario planner failed");
                String::new()
            }
        };

        let mut options = parse_options(&raw);
        if options.is_empty() {
            tracing::info!("Planner returned no usable scenarios, offering fallback");
            options.push(fallback_option());
        }
        options.truncate(count.max(1));
        options
    }
}
