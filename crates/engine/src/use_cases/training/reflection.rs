//! Reflection guide for the optional debrief.

use std::sync::Arc;

use motstand_domain::ScenarioContext;

use crate::infrastructure::agent_gateway::{AgentGateway, AgentRole, DEFAULT_TURN_BUDGET};
use crate::infrastructure::session::SessionHandle;

pub const REFLECTION_UNAVAILABLE: &str =
    "Jeg fikk ikke formulert et spørsmål akkurat nå. Prøv gjerne igjen.";

fn context_block(context: &ScenarioContext) -> String {
    format!(
        "Du er en rolig refleksjonsveileder.\n\
Brukerens rolle: {}\n\
Situasjon: {}\n\
Treningsmål: {}",
        context.role, context.situation, context.goal
    )
}

pub fn opening_prompt(context: &ScenarioContext, scenario_was_skipped: bool) -> String {
    if scenario_was_skipped {
        "Du er en rolig refleksjonsveileder.\n\
Brukeren valgte å avslutte scenarioet før det kom ordentlig i gang.\n\
\n\
Oppgave: Spør vennlig og nysgjerrig om hva som gjorde at de valgte å stoppe.\n\
Eksempel: \"Jeg ser at du avsluttet tidlig. Var det noe spesielt som gjorde at du valgte å stoppe, eller ville du bare teste funksjonen?\""
            .to_string()
    } else {
        format!(
            "{}\n\n\
Oppgave: Still et åpent, inviterende spørsmål for å starte refleksjonen.\n\
Spørsmålet bør handle om hvordan brukeren opplevde situasjonen.\n\
Eksempel: \"Hvordan føltes det å møte denne motstanden?\" eller \"Hva sitter du igjen med etter denne samtalen?\"",
            context_block(context)
        )
    }
}

pub struct ReflectionGuide {
    gateway: Arc<AgentGateway>,
}

impl ReflectionGuide {
    pub fn new(gateway: Arc<AgentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn start(
        &self,
        context: &ScenarioContext,
        session: &SessionHandle,
        scenario_was_skipped: bool,
    ) -> String {
        let prompt = opening_prompt(context, scenario_was_skipped);
        self.ask(&prompt, session).await
    }

    pub async fn reply(
        &self,
        context: &ScenarioContext,
        user_message: &str,
        session: &SessionHandle,
    ) -> String {
        let prompt = format!(
            "{}\n\n\
Still ett spørsmål av gangen, lytt og hjelp brukeren å hente ut læring uten å dømme.\n\
Brukerens siste refleksjon:\n\
{}",
            context_block(context),
            user_message
        );
        self.ask(&prompt, session).await
    }

    async fn ask(&self, prompt: &str, session: &SessionHandle) -> String {
        match self
            .gateway
            .run(AgentRole::Reflection, prompt, Some(session), DEFAULT_TURN_BUDGET)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Reflection agent failed");
                REFLECTION_UNAVAILABLE.to_string()
            }
        }
    }
}
