//! Sparring arcade steps of the training session.

use motstand_domain::catalog::{find_topic, sparring_topics};
use motstand_domain::{ArcadePhase, DomainError, Exchange, GameState, SparringRound, SparringTopic};

use crate::infrastructure::agent_gateway::AgentRole;

use super::{SessionError, Step, TrainingSession};

impl TrainingSession {
    pub fn topics(&self) -> Vec<SparringTopic> {
        sparring_topics()
    }

    pub fn open_sparring_menu(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::SelectScenario, "open the sparring menu")?;
        self.step = Step::TopicSelect;
        Ok(())
    }

    /// New game on a topic with a clean transcript and scenario memory
    pub async fn start_sparring(&mut self, topic_id: &str) -> Result<(), SessionError> {
        self.expect_step(Step::TopicSelect, "start sparring")?;
        let topic = find_topic(topic_id)
            .ok_or_else(|| DomainError::not_found("SparringTopic", topic_id))?;

        self.agent_sessions.replace(AgentRole::Scenario).await?;
        self.chat_history.clear();
        let rounds = self.sparring.engine.settings().rounds_per_level;
        tracing::info!(topic = %topic.id, rounds, "Sparring started");
        self.game = Some(GameState::new(topic, rounds));
        self.step = Step::Game;
        Ok(())
    }

    /// Generate whatever the game lacks and report where it stands
    pub async fn prepare_game(&mut self) -> Result<ArcadePhase, SessionError> {
        self.enter(Step::Game, "prepare the game")?;
        let Some(game) = self.game.as_mut() else {
            return Err(SessionError::Rerouted(Step::TopicSelect));
        };
        if game.phase() == ArcadePhase::LevelMissing {
            self.chat_history.clear();
        }
        Ok(self.sparring.engine.prepare(game, &self.chat_history).await)
    }

    pub fn current_round(&mut self) -> Option<&SparringRound> {
        self.game.as_mut()?.current_round()
    }

    /// Answer the current round and record it in the transcript
    pub fn choose_sparring_option(&mut self, option_index: usize) -> Result<Exchange, SessionError> {
        self.enter(Step::Game, "answer a round")?;
        let game = self
            .game
            .as_mut()
            .ok_or(SessionError::Rerouted(Step::TopicSelect))?;
        let exchange = self.sparring.engine.choose(game, option_index)?;
        self.append_chat_turn(exchange.to_chat_turn());
        Ok(exchange)
    }

    pub fn next_level(&mut self) -> Result<(), SessionError> {
        self.enter(Step::Game, "advance the level")?;
        let game = self
            .game
            .as_mut()
            .ok_or(SessionError::Rerouted(Step::TopicSelect))?;
        self.sparring.engine.next_level(game)?;
        Ok(())
    }

    /// After a lost game: back to topic selection
    pub fn restart_sparring(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::Game, "restart sparring")?;
        self.game = None;
        self.step = Step::TopicSelect;
        Ok(())
    }

    /// Leave the arcade for the main menu
    pub fn exit_to_menu(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::Game, "leave the game")?;
        self.game = None;
        self.step = Step::SelectScenario;
        Ok(())
    }
}
