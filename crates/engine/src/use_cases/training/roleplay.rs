//! Roleplay opponent for the live chat phase.

use std::sync::Arc;

use motstand_domain::{Difficulty, LearningParams, ScenarioContext};

use crate::infrastructure::agent_gateway::{AgentGateway, AgentRole, DEFAULT_TURN_BUDGET};
use crate::infrastructure::session::SessionHandle;

const DEFAULT_PERSONA: &str =
    "Du er motparten i en krevende samtale og trener brukerens motstandsdyktighet.";

/// Shown in place of the opponent's line when the agent call fails.
pub const ROLEPLAY_UNAVAILABLE: &str =
    "Motparten svarer ikke akkurat nå. Prøv å sende meldingen på nytt.";

fn difficulty_instruction(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "MODE: EASY. Be cooperative. Accept reasonable explanations quickly. Do not push back unless the user is rude."
        }
        Difficulty::Medium => {
            "MODE: MEDIUM. Be skeptical. Require clear arguments. Remain professional but firm."
        }
        Difficulty::Hard => {
            "MODE: HARD. Be stubborn, emotional, and difficult. Interrupt frequently. Interpret ambiguity negatively. Do not give in easily."
        }
    }
}

/// Persona prompt binding the model to the opponent character
pub fn roleplay_prompt(context: &ScenarioContext, params: &LearningParams) -> String {
    let opponent = context.opponent_label();
    let persona = context
        .agent_instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_PERSONA);
    let title = context.scenario_title.as_deref().unwrap_or("Egendefinert");
    let summary = context
        .scenario_summary
        .as_deref()
        .unwrap_or("Ingen ekstra beskrivelse");

    format!(
        "### SYSTEM INSTRUCTION: ROLEPLAY\n\
You are roleplaying as **{opponent}**.\n\
The User is roleplaying as **{role}**.\n\
\n\
**YOUR GOAL**:\n\
Provide realistic resistance training for the User. You must stay in character as {opponent} at all times.\n\
Do NOT act as a coach or advisor. Act ONLY as the character.\n\
\n\
**SCENARIO CONTEXT**:\n\
- **Your Character**: {opponent} ({persona})\n\
- **Situation**: {situation}\n\
- **User's Goal**: {goal}\n\
- **Scenario**: {title}\n\
- **Summary**: {summary}\n\
- **Difficulty**: {difficulty}\n\
\n\
**ADAPTATION PROFILE (Hidden)**:\n\
{profile}\n\
(Use this to adjust your intensity, but do not mention it).\n\
\n\
**DIFFICULTY INSTRUCTIONS**:\n\
{instruction}\n\
\n\
**RULES**:\n\
1.  **NEVER** break character.\n\
2.  **NEVER** speak for the User.\n\
3.  **NEVER** critique the User during the chat.\n\
4.  Keep responses concise (2-4 sentences).\n\
5.  Be direct and challenging, but realistic.",
        opponent = opponent,
        role = context.role,
        persona = persona,
        situation = context.situation,
        goal = context.goal,
        title = title,
        summary = summary,
        difficulty = context.difficulty,
        profile = params.profile_line(),
        instruction = difficulty_instruction(context.difficulty),
    )
}

pub struct Roleplay {
    gateway: Arc<AgentGateway>,
}

impl Roleplay {
    pub fn new(gateway: Arc<AgentGateway>) -> Self {
        Self { gateway }
    }

    /// Opening line that puts up resistance straight away
    pub async fn start(
        &self,
        context: &ScenarioContext,
        params: &LearningParams,
        session: &SessionHandle,
    ) -> String {
        let prompt = format!(
            "{}\n\nOppgave: Skriv kun den første replikken fra motparten som setter tydelig motstand.\n\
- Ikke beskriv bakgrunnen på nytt.\n\
- Hopp rett inn i konflikten.",
            roleplay_prompt(context, params)
        );
        self.ask(&prompt, session).await
    }

    /// Opponent's reply to the user's latest message
    pub async fn reply(
        &self,
        context: &ScenarioContext,
        params: &LearningParams,
        user_message: &str,
        session: &SessionHandle,
    ) -> String {
        let prompt = format!(
            "{}\n\nBrukerens siste melding:\n{}",
            roleplay_prompt(context, params),
            user_message
        );
        self.ask(&prompt, session).await
    }

    async fn ask(&self, prompt: &str, session: &SessionHandle) -> String {
        match self
            .gateway
            .run(AgentRole::Scenario, prompt, Some(session), DEFAULT_TURN_BUDGET)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Roleplay agent failed, using fallback line");
                ROLEPLAY_UNAVAILABLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::ports::SessionMemoryPort;
    use crate::infrastructure::session::AgentSessions;
    use crate::test_fixtures::{gateway_with, FailingLlm, ScriptedLlm};
    use motstand_domain::catalog::find_scenario;

    fn steamroller() -> ScenarioContext {
        find_scenario("steamroller").unwrap().to_context()
    }

    #[test]
    fn test_prompt_binds_opponent_and_difficulty() {
        let context = steamroller().with_difficulty(Difficulty::Hard);
        let prompt = roleplay_prompt(&context, &LearningParams::new());

        assert!(prompt.contains("You are roleplaying as **Reidar**."));
        assert!(prompt.contains("- **Difficulty**: Hard"));
        assert!(prompt.contains("MODE: HARD."));
        assert!(prompt.contains("Resilience (Stamina): 0.50, Clarity: 0.50, Empathy: 0.50"));
    }

    #[test]
    fn test_prompt_defaults_for_custom_context() {
        let context = ScenarioContext::new("Leder", "Budsjettmøte", "Holde fast på kravet");
        let prompt = roleplay_prompt(&context, &LearningParams::new());

        assert!(prompt.contains("**Motstandstrener**"));
        assert!(prompt.contains(DEFAULT_PERSONA));
        assert!(prompt.contains("- **Summary**: Ingen ekstra beskrivelse"));
        assert!(prompt.contains("MODE: MEDIUM."));
    }

    #[tokio::test]
    async fn test_start_uses_scenario_session() {
        let llm = Arc::new(ScriptedLlm::new(["Nei, vi gjør det på min måte."]));
        let (gateway, memory) = gateway_with(llm.clone());
        let sessions = AgentSessions::new(memory.clone(), Arc::new(FixedRandom(0)));
        let handle = sessions.get(AgentRole::Scenario).unwrap();

        let line = Roleplay::new(gateway)
            .start(&steamroller(), &LearningParams::new(), handle)
            .await;

        assert_eq!(line, "Nei, vi gjør det på min måte.");
        assert!(llm.prompt_text(0).contains("Hopp rett inn i konflikten."));
        assert_eq!(memory.load_items(handle.id()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reply_falls_back_on_failure() {
        let (gateway, memory) = gateway_with(Arc::new(FailingLlm));
        let sessions = AgentSessions::new(memory, Arc::new(FixedRandom(0)));

        let line = Roleplay::new(gateway)
            .reply(
                &steamroller(),
                &LearningParams::new(),
                "Kan jeg få snakke ferdig?",
                sessions.get(AgentRole::Scenario).unwrap(),
            )
            .await;

        assert_eq!(line, ROLEPLAY_UNAVAILABLE);
    }
}
