//! Arcade game state and its transitions
//!
//! The state is owned by one play session. Its phase is derived, never stored:
//!
//! ```text
//! LevelMissing -> RoundsMissing -> Playing -> PlayerDepleted
//!                                         \-> BatchExhausted -> (next level) LevelMissing
//! ```
//!
//! Hit points may go negative; depletion is only checked when the phase is
//! read, and it wins over batch exhaustion.

use serde::{Deserialize, Serialize};

use super::chat::ChatTurn;
use super::sparring::{OptionKind, SparringLevel, SparringRound, SparringTopic};
use crate::error::DomainError;
use crate::value_objects::BASE_HIT_POINTS;

/// Score awarded for clearing a level
pub const LEVEL_CLEAR_SCORE: u32 = 100;

/// Default number of rounds generated per level
pub const DEFAULT_ROUNDS_PER_LEVEL: usize = 5;

/// Where the arcade loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcadePhase {
    /// No opponent yet for the current level number
    LevelMissing,
    /// Opponent known, round batch not generated yet
    RoundsMissing,
    /// A round is waiting for an answer
    Playing,
    /// Every round in the batch was answered
    BatchExhausted,
    /// Player hit points reached zero or below
    PlayerDepleted,
}

/// Result of answering a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub attack: String,
    pub answer: String,
    pub feedback: String,
    pub kind: OptionKind,
    pub damage_user: u32,
    pub damage_opponent: u32,
    pub player_hp: i32,
    pub opponent_hp: i32,
}

impl Exchange {
    /// Transcript entry: the player's answer against the opponent's attack
    pub fn to_chat_turn(&self) -> ChatTurn {
        ChatTurn::new(self.answer.clone(), self.attack.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub topic: SparringTopic,
    pub level_number: u32,
    pub score: u32,
    pub level: Option<SparringLevel>,
    pub player_hp: i32,
    pub opponent_hp: i32,
    pub rounds: Vec<SparringRound>,
    pub round_index: usize,
    /// Round currently shown; cleared after each answer
    pub current_round: Option<SparringRound>,
    pub total_rounds: usize,
}

impl GameState {
    /// Fresh endless-mode state at level 1
    pub fn new(topic: SparringTopic, total_rounds: usize) -> Self {
        Self {
            topic,
            level_number: 1,
            score: 0,
            level: None,
            player_hp: BASE_HIT_POINTS,
            opponent_hp: BASE_HIT_POINTS,
            rounds: Vec::new(),
            round_index: 0,
            current_round: None,
            total_rounds,
        }
    }

    pub fn phase(&self) -> ArcadePhase {
        if self.level.is_none() {
            ArcadePhase::LevelMissing
        } else if self.rounds.is_empty() {
            ArcadePhase::RoundsMissing
        } else if self.player_hp <= 0 {
            ArcadePhase::PlayerDepleted
        } else if self.round_index >= self.rounds.len() {
            ArcadePhase::BatchExhausted
        } else {
            ArcadePhase::Playing
        }
    }

    /// Install the opponent for the current level and reset the board
    pub fn install_level(&mut self, level: SparringLevel) {
        self.player_hp = level.initial_player_hp;
        self.opponent_hp = level.initial_opponent_hp;
        self.level = Some(level);
        self.rounds.clear();
        self.round_index = 0;
        self.current_round = None;
    }

    /// Install a pre-generated batch of rounds
    pub fn install_rounds(&mut self, rounds: Vec<SparringRound>) -> Result<(), DomainError> {
        if self.level.is_none() {
            return Err(DomainError::invalid_state_transition(
                "rounds cannot be installed before the level",
            ));
        }

        self.current_round = rounds.first().cloned();
        self.rounds = rounds;
        self.round_index = 0;
        Ok(())
    }

    /// The round waiting for an answer, pulled from the batch when needed
    pub fn current_round(&mut self) -> Option<&SparringRound> {
        if self.phase() != ArcadePhase::Playing {
            return None;
        }
        if self.current_round.is_none() {
            self.current_round = self.rounds.get(self.round_index).cloned();
        }
        self.current_round.as_ref()
    }

    /// Answer the current round with the option at `option_index`.
    ///
    /// Both sides take their damage from the same exchange. The cursor moves
    /// on and the current-round pointer is cleared.
    pub fn apply_option(&mut self, option_index: usize) -> Result<Exchange, DomainError> {
        let phase = self.phase();
        if phase != ArcadePhase::Playing {
            return Err(DomainError::invalid_state_transition(format!(
                "cannot answer a round in phase {:?}",
                phase
            )));
        }

        let round = match self.current_round.take() {
            Some(round) => round,
            None => self.rounds[self.round_index].clone(),
        };

        let option = match round.option(option_index) {
            Some(option) => option.clone(),
            None => {
                self.current_round = Some(round);
                return Err(DomainError::not_found("SparringOption", option_index.to_string()));
            }
        };

        self.player_hp = self.player_hp.saturating_sub_unsigned(option.damage_user);
        self.opponent_hp = self.opponent_hp.saturating_sub_unsigned(option.damage_opponent);
        self.round_index += 1;

        Ok(Exchange {
            attack: round.attack().to_string(),
            answer: option.text,
            feedback: option.feedback,
            kind: option.kind,
            damage_user: option.damage_user,
            damage_opponent: option.damage_opponent,
            player_hp: self.player_hp,
            opponent_hp: self.opponent_hp,
        })
    }

    /// Move to the next level after a cleared batch.
    ///
    /// Awards [`LEVEL_CLEAR_SCORE`] and clears the level and rounds so both
    /// are generated again.
    pub fn advance_level(&mut self) -> Result<(), DomainError> {
        let phase = self.phase();
        if phase != ArcadePhase::BatchExhausted {
            return Err(DomainError::invalid_state_transition(format!(
                "cannot advance level in phase {:?}",
                phase
            )));
        }

        self.level_number += 1;
        self.score += LEVEL_CLEAR_SCORE;
        self.level = None;
        self.rounds.clear();
        self.round_index = 0;
        self.current_round = None;
        Ok(())
    }

    /// Position label, e.g. "Situasjon 2 av 5"
    pub fn progress_label(&self) -> String {
        format!("Situasjon {} av {}", self.round_index + 1, self.rounds.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sparring::SparringOption;

    fn topic() -> SparringTopic {
        SparringTopic::new("gym_guru", "Gym-guru", "Belærer deg", "🏋️")
    }

    fn level(player: i32, opponent: i32) -> SparringLevel {
        SparringLevel {
            id: "gym_guru_lvl_1".to_string(),
            title: "Nivå 1: Coach".to_string(),
            opponent_name: "Kai".to_string(),
            opponent_role: "Coach".to_string(),
            attack_style: "Belærende".to_string(),
            weakness: "Fakta".to_string(),
            win_condition: "Hold roen".to_string(),
            opponent_instructions: "Vær pågående".to_string(),
            initial_player_hp: player,
            initial_opponent_hp: opponent,
            avatar: "🧠".to_string(),
        }
    }

    fn round(damage_user: u32) -> SparringRound {
        SparringRound::new(
            "Treningssenteret",
            "Du løfter feil!",
            vec![
                SparringOption::new("Unnskyld", damage_user, 0, "Au", OptionKind::CriticalFail),
                SparringOption::new("Kanskje", 12, 0, "Vagt", OptionKind::Weak),
                SparringOption::new("Nei takk", 0, 12, "Bra", OptionKind::Good),
                SparringOption::new("Jeg har PT", 0, 25, "Treff", OptionKind::CriticalHit),
            ],
        )
        .unwrap()
    }

    fn playing_state(rounds: usize) -> GameState {
        let mut state = GameState::new(topic(), rounds);
        state.install_level(level(100, 100));
        state
            .install_rounds((0..rounds).map(|_| round(25)).collect())
            .unwrap();
        state
    }

    #[test]
    fn test_phase_progression() {
        let mut state = GameState::new(topic(), 5);
        assert_eq!(state.phase(), ArcadePhase::LevelMissing);

        state.install_level(level(100, 120));
        assert_eq!(state.phase(), ArcadePhase::RoundsMissing);
        assert_eq!(state.opponent_hp, 120);

        state.install_rounds(vec![round(25)]).unwrap();
        assert_eq!(state.phase(), ArcadePhase::Playing);
        assert!(state.current_round.is_some());
    }

    #[test]
    fn test_rounds_before_level_is_rejected() {
        let mut state = GameState::new(topic(), 5);
        assert!(state.install_rounds(vec![round(1)]).is_err());
    }

    #[test]
    fn test_both_sides_take_damage_from_one_exchange() {
        let mut state = GameState::new(topic(), 1);
        state.install_level(level(100, 100));
        let mixed = SparringRound::new(
            "ctx",
            "atk",
            vec![
                SparringOption::new("x", 5, 7, "f", OptionKind::Good),
                SparringOption::new("y", 0, 0, "f", OptionKind::Weak),
                SparringOption::new("z", 0, 0, "f", OptionKind::Weak),
                SparringOption::new("w", 0, 0, "f", OptionKind::Weak),
            ],
        )
        .unwrap();
        state.install_rounds(vec![mixed]).unwrap();

        let exchange = state.apply_option(0).unwrap();
        assert_eq!(exchange.player_hp, 95);
        assert_eq!(exchange.opponent_hp, 93);
        assert_eq!(state.round_index, 1);
        assert!(state.current_round.is_none());
    }

    #[test]
    fn test_heavy_hit_depletes_player_without_floor() {
        let mut state = GameState::new(topic(), 5);
        state.install_level(level(20, 100));
        state
            .install_rounds((0..5).map(|_| round(30)).collect())
            .unwrap();

        let exchange = state.apply_option(0).unwrap();

        assert_eq!(exchange.player_hp, -10);
        assert_eq!(state.player_hp, -10);
        assert_eq!(state.phase(), ArcadePhase::PlayerDepleted);
        assert!(state.apply_option(0).is_err());
        assert!(state.current_round().is_none());
    }

    #[test]
    fn test_depletion_wins_over_exhaustion() {
        let mut state = GameState::new(topic(), 1);
        state.install_level(level(10, 100));
        state.install_rounds(vec![round(30)]).unwrap();
        state.apply_option(0).unwrap();
        assert_eq!(state.phase(), ArcadePhase::PlayerDepleted);
    }

    #[test]
    fn test_exhausting_batch_then_next_level() {
        let mut state = playing_state(5);
        for _ in 0..5 {
            assert!(state.current_round().is_some());
            state.apply_option(2).unwrap();
        }
        assert_eq!(state.phase(), ArcadePhase::BatchExhausted);

        state.advance_level().unwrap();

        assert_eq!(state.score, 100);
        assert_eq!(state.level_number, 2);
        assert!(state.level.is_none());
        assert!(state.rounds.is_empty());
        assert_eq!(state.phase(), ArcadePhase::LevelMissing);
    }

    #[test]
    fn test_advance_level_only_after_clear() {
        let mut state = playing_state(2);
        assert!(state.advance_level().is_err());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_unknown_option_keeps_round() {
        let mut state = playing_state(2);
        assert!(state.apply_option(9).is_err());
        assert_eq!(state.round_index, 0);
        assert!(state.current_round.is_some());
        assert_eq!(state.player_hp, 100);
    }

    #[test]
    fn test_exchange_becomes_transcript_turn() {
        let mut state = playing_state(1);
        let turn = state.apply_option(3).unwrap().to_chat_turn();
        assert_eq!(turn.user, "Jeg har PT");
        assert_eq!(turn.assistant, "Du løfter feil!");
    }
}
