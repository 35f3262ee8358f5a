//! Starting hit points per sparring level
//!
//! Both sides start at 100. From level 4 the opponent gets more stamina
//! (120); from level 7 the player starts tired (80).

use serde::{Deserialize, Serialize};

pub const BASE_HIT_POINTS: i32 = 100;
pub const TOUGH_OPPONENT_HIT_POINTS: i32 = 120;
pub const TIRED_PLAYER_HIT_POINTS: i32 = 80;

/// Level from which the opponent starts with extra hit points
pub const TOUGH_OPPONENT_FROM_LEVEL: u32 = 4;
/// Level from which the player starts with reduced hit points
pub const TIRED_PLAYER_FROM_LEVEL: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingHitPoints {
    pub player: i32,
    pub opponent: i32,
}

impl StartingHitPoints {
    pub fn for_level(level_number: u32) -> Self {
        let opponent = if level_number >= TOUGH_OPPONENT_FROM_LEVEL {
            TOUGH_OPPONENT_HIT_POINTS
        } else {
            BASE_HIT_POINTS
        };
        let player = if level_number >= TIRED_PLAYER_FROM_LEVEL {
            TIRED_PLAYER_HIT_POINTS
        } else {
            BASE_HIT_POINTS
        };

        Self { player, opponent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_holds_for_every_level() {
        for level in 0..=20u32 {
            let hp = StartingHitPoints::for_level(level);
            let expected_opponent = if level >= 4 { 120 } else { 100 };
            let expected_player = if level >= 7 { 80 } else { 100 };
            assert_eq!(hp.opponent, expected_opponent, "level {}", level);
            assert_eq!(hp.player, expected_player, "level {}", level);
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(
            StartingHitPoints::for_level(3),
            StartingHitPoints { player: 100, opponent: 100 }
        );
        assert_eq!(
            StartingHitPoints::for_level(4),
            StartingHitPoints { player: 100, opponent: 120 }
        );
        assert_eq!(
            StartingHitPoints::for_level(7),
            StartingHitPoints { player: 80, opponent: 120 }
        );
    }
}
