//! Arcade engine: drives a [`GameState`] through generation and play.

use std::sync::Arc;

use motstand_domain::game_rules::fallback_batch;
use motstand_domain::{ArcadePhase, ChatTurn, DomainError, Exchange, GameState, SparringRound};

use crate::infrastructure::settings::SparringSettings;

use super::referee::Referee;

pub struct ArcadeEngine {
    referee: Arc<Referee>,
    settings: SparringSettings,
}

impl ArcadeEngine {
    pub fn new(referee: Arc<Referee>, settings: SparringSettings) -> Self {
        Self { referee, settings }
    }

    pub fn settings(&self) -> SparringSettings {
        self.settings
    }

    /// Generate whatever the state is missing, then report the playable phase.
    ///
    /// Returns `Playing`, `BatchExhausted` or `PlayerDepleted`; never leaves the
    /// state without a level and rounds.
    pub async fn prepare(&self, state: &mut GameState, history: &[ChatTurn]) -> ArcadePhase {
        loop {
            match state.phase() {
                ArcadePhase::LevelMissing => {
                    let level = self
                        .referee
                        .generate_level(&state.topic, state.level_number)
                        .await;
                    tracing::info!(
                        level = state.level_number,
                        opponent = %level.opponent_name,
                        player_hp = level.initial_player_hp,
                        opponent_hp = level.initial_opponent_hp,
                        "Level installed"
                    );
                    state.install_level(level);
                }
                ArcadePhase::RoundsMissing => {
                    let rounds = self.generate_rounds(state, history).await;
                    tracing::info!(rounds = rounds.len(), "Rounds installed");
                    if let Err(e) = state.install_rounds(rounds) {
                        tracing::warn!(error = %e, "Could not install rounds");
                    }
                }
                phase => return phase,
            }
        }
    }

    async fn generate_rounds(&self, state: &GameState, history: &[ChatTurn]) -> Vec<SparringRound> {
        let Some(level) = state.level.as_ref() else {
            return Vec::new();
        };
        let count = state.total_rounds.max(1);

        let rounds = if self.settings.batch_rounds {
            self.referee.generate_round_batch(level, count).await
        } else {
            let mut rounds = Vec::with_capacity(count);
            for _ in 0..count {
                rounds.push(self.referee.generate_round(level, history).await);
            }
            rounds
        };

        if rounds.is_empty() {
            fallback_batch(level, count)
        } else {
            rounds
        }
    }

    /// Answer the current round
    pub fn choose(&self, state: &mut GameState, option_index: usize) -> Result<Exchange, DomainError> {
        let exchange = state.apply_option(option_index)?;
        tracing::debug!(
            kind = %exchange.kind,
            player_hp = exchange.player_hp,
            opponent_hp = exchange.opponent_hp,
            "Round answered"
        );
        if state.phase() == ArcadePhase::PlayerDepleted {
            tracing::info!(level = state.level_number, score = state.score, "Player depleted");
        }
        Ok(exchange)
    }

    /// Move on after a cleared batch; the next `prepare` generates the new level
    pub fn next_level(&self, state: &mut GameState) -> Result<(), DomainError> {
        state.advance_level()?;
        tracing::info!(level = state.level_number, score = state.score, "Advanced to next level");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::test_fixtures::{gateway_with, FailingLlm, ScriptedLlm};
    use motstand_domain::catalog::find_topic;
    use motstand_domain::game_rules::fallback_level;
    use motstand_domain::{OptionKind, SparringOption, SparringTopic};

    fn topic() -> SparringTopic {
        find_topic("gym_guru").unwrap()
    }

    fn engine(llm: Arc<dyn crate::infrastructure::ports::LlmPort>, batch_rounds: bool) -> ArcadeEngine {
        let (gateway, _) = gateway_with(llm);
        let referee = Arc::new(Referee::new(gateway, Arc::new(FixedRandom(0))));
        ArcadeEngine::new(
            referee,
            SparringSettings {
                rounds_per_level: 5,
                batch_rounds,
            },
        )
    }

    fn heavy_round() -> SparringRound {
        SparringRound::from_options(
            "Garderoben",
            "Du trener feil.",
            [
                SparringOption::new("Unnskyld", 30, 0, "Au", OptionKind::CriticalFail),
                SparringOption::new("Kanskje", 10, 0, "Svakt", OptionKind::Weak),
                SparringOption::new("Nei takk", 0, 10, "Bra", OptionKind::Good),
                SparringOption::new("Fakta", 0, 30, "Treff", OptionKind::CriticalHit),
            ],
        )
    }

    #[tokio::test]
    async fn test_prepare_with_offline_model_uses_fallbacks() {
        let engine = engine(Arc::new(FailingLlm), true);
        let mut state = GameState::new(topic(), 5);

        let phase = engine.prepare(&mut state, &[]).await;

        assert_eq!(phase, ArcadePhase::Playing);
        let level = state.level.as_ref().unwrap();
        assert_eq!(level.opponent_name, topic().title);
        assert_eq!(state.rounds.len(), 5);
        assert_eq!(state.player_hp, 100);
    }

    #[tokio::test]
    async fn test_unbatched_generation_makes_one_call_per_round() {
        let llm = Arc::new(ScriptedLlm::new(Vec::<String>::new()));
        let engine = engine(llm.clone(), false);
        let mut state = GameState::new(topic(), 3);

        engine.prepare(&mut state, &[]).await;

        // one level request plus three round requests
        assert_eq!(llm.call_count(), 4);
        assert_eq!(state.rounds.len(), 3);
    }

    #[tokio::test]
    async fn test_heavy_damage_depletes_player() {
        let engine = engine(Arc::new(FailingLlm), true);
        let mut state = GameState::new(topic(), 5);
        state.install_level(fallback_level(&topic(), 1));
        state.install_rounds(vec![heavy_round()]).unwrap();
        state.player_hp = 20;

        let exchange = engine.choose(&mut state, 0).unwrap();

        assert_eq!(exchange.player_hp, -10);
        assert_eq!(state.phase(), ArcadePhase::PlayerDepleted);
        assert_eq!(engine.prepare(&mut state, &[]).await, ArcadePhase::PlayerDepleted);
    }

    #[tokio::test]
    async fn test_clearing_batch_then_next_level() {
        let engine = engine(Arc::new(FailingLlm), true);
        let mut state = GameState::new(topic(), 5);
        engine.prepare(&mut state, &[]).await;

        for _ in 0..5 {
            let option = state
                .current_round()
                .unwrap()
                .options()
                .iter()
                .position(|o| o.damage_user == 0)
                .unwrap();
            engine.choose(&mut state, option).unwrap();
        }
        assert_eq!(state.phase(), ArcadePhase::BatchExhausted);

        engine.next_level(&mut state).unwrap();

        assert_eq!(state.level_number, 2);
        assert_eq!(state.score, 100);
        assert!(state.level.is_none());
        assert!(state.rounds.is_empty());
        assert_eq!(engine.prepare(&mut state, &[]).await, ArcadePhase::Playing);
    }

    #[test]
    fn test_next_level_rejected_mid_batch() {
        let engine = engine(Arc::new(FailingLlm), true);
        let mut state = GameState::new(topic(), 5);
        state.install_level(fallback_level(&topic(), 1));
        state.install_rounds(vec![heavy_round()]).unwrap();

        assert!(engine.next_level(&mut state).is_err());
        assert_eq!(state.level_number, 1);
    }
}
