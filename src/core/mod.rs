//! Core types: horses, players, RNG, configuration, game state.

pub mod config;
pub mod horse;
pub mod player;
pub mod rng;
pub mod state;

pub use config::{ConfigError, GameConfig, Timing};
pub use horse::{HorseId, Ranking, RankingError};
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use state::{GamePhase, GameState, Placement, PlacementSide, PlayRecord, TurnPhase};
