//! Per-session game settings.

use crate::board::RobberMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable rules for one game session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub score_needed_to_win: u32,
    pub robber_mode: RobberMode,
    /// Hand size at which a seven forces a discard
    pub card_count_loss_threshold: u32,
    pub minimum_longest_road: u32,
    /// Seconds per turn, 0 for no limit
    pub turn_time_limit_secs: u64,
    pub dice_count: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            score_needed_to_win: 10,
            robber_mode: RobberMode::Normal,
            card_count_loss_threshold: 8,
            minimum_longest_road: 5,
            turn_time_limit_secs: 0,
            dice_count: 2,
        }
    }
}

impl GameSettings {
    pub fn turn_time_limit(&self) -> Option<Duration> {
        (self.turn_time_limit_secs > 0).then(|| Duration::from_secs(self.turn_time_limit_secs))
    }
}

/// Knights in play needed before largest army can be claimed
pub const MINIMUM_LARGEST_ARMY: u32 = 3;

/// Lobby bounds
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();
        assert_eq!(settings.score_needed_to_win, 10);
        assert_eq!(settings.robber_mode, RobberMode::Normal);
        assert_eq!(settings.card_count_loss_threshold, 8);
        assert_eq!(settings.minimum_longest_road, 5);
        assert_eq!(settings.turn_time_limit(), None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: GameSettings =
            serde_json::from_str(r#"{"score_needed_to_win": 12, "turn_time_limit_secs": 90}"#)
                .unwrap();
        assert_eq!(settings.score_needed_to_win, 12);
        assert_eq!(settings.turn_time_limit(), Some(Duration::from_secs(90)));
        assert_eq!(settings.dice_count, 2);
    }
}
