//! Supportive feedback once the scenario chat ends.

use std::sync::Arc;

use motstand_domain::{transcript_lines, ChatTurn, ScenarioContext};

use crate::infrastructure::agent_gateway::{AgentGateway, AgentRole};
use crate::infrastructure::session::SessionHandle;

/// Turn budget for feedback runs.
pub const FEEDBACK_TURN_BUDGET: u32 = 4;

/// Minimum transcript length before the model is asked for feedback.
pub const MIN_TURNS_FOR_FEEDBACK: usize = 2;

pub const TOO_SHORT_FOR_FEEDBACK: &str = "Du avsluttet scenarioet før vi kom ordentlig i gang. Start gjerne et nytt scenario for å få tilbakemelding.";

pub const FEEDBACK_UNAVAILABLE: &str =
    "Vi klarte ikke å lage tilbakemelding akkurat nå. Prøv igjen om litt.";

pub fn feedback_prompt(context: &ScenarioContext, history: &[ChatTurn]) -> String {
    format!(
        "Du er en varm, klok og støttende veileder i motstandstrening.\n\
Din oppgave er å gi brukeren en følelse av mestring, samtidig som du peker på muligheter for vekst.\n\
\n\
Rolle: {role}\n\
Situasjon: {situation}\n\
Treningsmål: {goal}\n\
\n\
Dialog:\n\
{dialog}\n\
\n\
Instruksjoner for tilbakemelding:\n\
1.  **Anerkjennelse**: Start med å nevne noe brukeren gjorde bra (f.eks. \"Jeg likte hvordan du...\").\n\
2.  **Forslag**: Gi 2-3 konkrete, vennlige forslag til neste gang. Bruk formuleringer som \"Du kan prøve å...\" eller \"Det kan være spennende å utforske...\".\n\
3.  **Tone**: Vær ydmyk. Du sitter ikke med fasiten. Unngå ord som \"feil\", \"dårlig\", \"burde\".\n\
4.  **Format**: Skriv på norsk, bruk punktliste.",
        role = context.role,
        situation = context.situation,
        goal = context.goal,
        dialog = transcript_lines(history, "Bruker", "Trener"),
    )
}

pub struct FeedbackWriter {
    gateway: Arc<AgentGateway>,
}

impl FeedbackWriter {
    pub fn new(gateway: Arc<AgentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn generate(
        &self,
        context: &ScenarioContext,
        history: &[ChatTurn],
        session: &SessionHandle,
    ) -> String {
        if history.len() < MIN_TURNS_FOR_FEEDBACK {
            tracing::debug!(turns = history.len(), "Transcript too short for feedback");
            return TOO_SHORT_FOR_FEEDBACK.to_string();
        }

        let prompt = feedback_prompt(context, history);
        match self
            .gateway
            .run(AgentRole::Feedback, &prompt, Some(session), FEEDBACK_TURN_BUDGET)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Feedback agent failed");
                FEEDBACK_UNAVAILABLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::session::AgentSessions;
    use crate::test_fixtures::{gateway_with, FailingLlm, ScriptedLlm};

    fn context() -> ScenarioContext {
        ScenarioContext::new("Teamleder", "Ansatt kommer for sent", "Sette en tydelig grense")
    }

    #[tokio::test]
    async fn test_short_transcript_makes_no_call() {
        let llm = Arc::new(ScriptedLlm::new(Vec::<String>::new()));
        let (gateway, memory) = gateway_with(llm.clone());
        let sessions = AgentSessions::new(memory, Arc::new(FixedRandom(0)));

        let text = FeedbackWriter::new(gateway)
            .generate(
                &context(),
                &[ChatTurn::opening("Hva vil du?")],
                sessions.get(AgentRole::Feedback).unwrap(),
            )
            .await;

        assert_eq!(text, TOO_SHORT_FOR_FEEDBACK);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_contains_dialog() {
        let llm = Arc::new(ScriptedLlm::new(["- Du holdt roen."]));
        let (gateway, memory) = gateway_with(llm.clone());
        let sessions = AgentSessions::new(memory, Arc::new(FixedRandom(0)));
        let history = vec![
            ChatTurn::opening("Jeg rakk ikke bussen."),
            ChatTurn::new("Det er tredje gang denne uken.", "Ja, og?"),
        ];

        let text = FeedbackWriter::new(gateway)
            .generate(&context(), &history, sessions.get(AgentRole::Feedback).unwrap())
            .await;

        assert_eq!(text, "- Du holdt roen.");
        let prompt = llm.prompt_text(0);
        assert!(prompt.contains("Bruker: Det er tredje gang denne uken.\nTrener: Ja, og?"));
        assert!(prompt.contains("Treningsmål: Sette en tydelig grense"));
    }

    #[tokio::test]
    async fn test_failure_returns_fixed_message() {
        let (gateway, memory) = gateway_with(Arc::new(FailingLlm));
        let sessions = AgentSessions::new(memory, Arc::new(FixedRandom(0)));
        let history = vec![ChatTurn::new("a", "b"), ChatTurn::new("c", "d")];

        let text = FeedbackWriter::new(gateway)
            .generate(&context(), &history, sessions.get(AgentRole::Feedback).unwrap())
            .await;

        assert_eq!(text, FEEDBACK_UNAVAILABLE);
    }
}
