//! Match configuration.
//!
//! `GameConfig` carries the table constants (seats, horses, tokens, deck
//! size, scoring table) and the pacing delays the engine schedules between
//! steps. The defaults reproduce the standard four-seat, seven-horse game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::CardType;

/// Why a configuration cannot start a match.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("player count must be 2-8, got {0}")]
    PlayerCount(usize),
    #[error("at least 3 horses are required, got {0}")]
    HorseCount(usize),
    #[error("rank point table has {got} entries, expected one per horse ({expected})")]
    RankPoints { got: usize, expected: usize },
    #[error("deck of {total} cards cannot deal {per_player} to each of {players} players")]
    DeckTooSmall {
        total: usize,
        per_player: usize,
        players: usize,
    },
    #[error("no card types enabled")]
    NoCardTypes,
    #[error("AI token probability must be within [0, 1], got {0}")]
    TokenProbability(f64),
}

/// Simulated-time delays in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Pause between the start message and the first turn.
    pub start_delay: u64,
    /// Pause before a computer opponent acts.
    pub ai_turn_delay: u64,
    /// Animation hold after a card resolves, before the turn ends.
    pub card_hold: u64,
    /// Pause between an opponent taking a token and playing its card.
    pub ai_token_play_delay: u64,
    /// Pause before an opponent resolves a betting exchange.
    pub ai_exchange_delay: u64,
    /// Pause before an opponent places a horse.
    pub ai_placement_delay: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            start_delay: 2000,
            ai_turn_delay: 1000,
            card_hold: 1000,
            ai_token_play_delay: 500,
            ai_exchange_delay: 1000,
            ai_placement_delay: 1000,
        }
    }
}

/// Match configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seats at the table, human included.
    pub player_count: usize,

    /// Horses in the race.
    pub horse_count: usize,

    /// Dark-horse tokens in the shared pool.
    pub dark_horse_tokens: u32,

    /// Cards dealt to each seat.
    pub cards_per_player: usize,

    /// Cards generated before dealing.
    pub total_action_cards: usize,

    /// Points per rank index (index 0 = last place).
    pub rank_points: Vec<i64>,

    /// Per-token bonus when the dark horse finishes in the top three.
    pub token_bonus: i64,

    /// Per-token score otherwise (negative).
    pub token_penalty: i64,

    /// Card types the generator draws from.
    pub card_types: Vec<CardType>,

    /// Chance an opponent grabs a token when it may.
    pub ai_token_probability: f64,

    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Pacing delays.
    pub timing: Timing,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 4,
            horse_count: 7,
            dark_horse_tokens: 2,
            cards_per_player: 6,
            total_action_cards: 40,
            rank_points: vec![0, 1, 2, 3, 5, 7, 10],
            token_bonus: 5,
            token_penalty: -3,
            card_types: CardType::ALL.to_vec(),
            ai_token_probability: 0.2,
            seed: None,
            timing: Timing::default(),
        }
    }
}

impl GameConfig {
    /// Check the configuration can run a match.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=8).contains(&self.player_count) {
            return Err(ConfigError::PlayerCount(self.player_count));
        }
        if self.horse_count < 3 || self.horse_count > u8::MAX as usize {
            return Err(ConfigError::HorseCount(self.horse_count));
        }
        if self.rank_points.len() != self.horse_count {
            return Err(ConfigError::RankPoints {
                got: self.rank_points.len(),
                expected: self.horse_count,
            });
        }
        if self.total_action_cards < self.player_count * self.cards_per_player {
            return Err(ConfigError::DeckTooSmall {
                total: self.total_action_cards,
                per_player: self.cards_per_player,
                players: self.player_count,
            });
        }
        if self.card_types.is_empty() {
            return Err(ConfigError::NoCardTypes);
        }
        if !(0.0..=1.0).contains(&self.ai_token_probability) {
            return Err(ConfigError::TokenProbability(self.ai_token_probability));
        }
        Ok(())
    }

    /// Set a fixed RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Restrict the generator to the given card types.
    #[must_use]
    pub fn with_card_types(mut self, types: impl Into<Vec<CardType>>) -> Self {
        self.card_types = types.into();
        self
    }

    /// Set the opponent token probability.
    #[must_use]
    pub fn with_ai_token_probability(mut self, probability: f64) -> Self {
        self.ai_token_probability = probability;
        self
    }

    /// Set the number of cards dealt per seat.
    #[must_use]
    pub fn with_cards_per_player(mut self, count: usize) -> Self {
        self.cards_per_player = count;
        self
    }

    /// Replace the pacing delays.
    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.player_count, 4);
        assert_eq!(config.horse_count, 7);
        assert_eq!(config.rank_points, vec![0, 1, 2, 3, 5, 7, 10]);
        assert_eq!(config.card_types.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_player_count() {
        let config = GameConfig {
            player_count: 1,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PlayerCount(1)));
    }

    #[test]
    fn test_validate_rank_points() {
        let config = GameConfig {
            rank_points: vec![0, 1, 2],
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::RankPoints { got: 3, expected: 7 })
        );
    }

    #[test]
    fn test_validate_deck_size() {
        let config = GameConfig::default().with_cards_per_player(11);
        assert!(matches!(config.validate(), Err(ConfigError::DeckTooSmall { .. })));
    }

    #[test]
    fn test_validate_card_types_and_probability() {
        let config = GameConfig::default().with_card_types(Vec::new());
        assert_eq!(config.validate(), Err(ConfigError::NoCardTypes));

        let config = GameConfig::default().with_ai_token_probability(1.5);
        assert_eq!(config.validate(), Err(ConfigError::TokenProbability(1.5)));
    }

    #[test]
    fn test_config_serde() {
        let config = GameConfig::default().with_seed(42);
        let json = serde_json::to_string(&config).unwrap();
        let restored: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
