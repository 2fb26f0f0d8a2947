//! # dark-horse
//!
//! Rules engine for a four-seat horse-racing card game: one human against
//! three computer opponents, seven horses, two dark-horse tokens.
//!
//! ## Match flow
//!
//! 1. **Betting**: the human backs two horses.
//! 2. **Placement**: seats take turns lining horses up; the horse left over
//!    is the dark horse.
//! 3. **Playing**: each turn a seat may take a dark-horse token, then plays
//!    one action card that reshuffles the ranking. The race ends when every
//!    hand is empty.
//!
//! Standings come from where each seat's betting horses finished, plus a
//! token bonus or penalty depending on the dark horse's finish.
//!
//! ## Architecture
//!
//! - **Single writer**: `GameState` is owned by the engine and changes only
//!   through its own methods, each of which emits a typed notification.
//!
//! - **Simulated time**: delays are tasks on a millisecond clock the host
//!   steps explicitly, so a whole match can run headless and deterministic
//!   under a fixed seed.
//!
//! ## Modules
//!
//! - `core`: horses, rankings, players, RNG, configuration, state
//! - `cards`: action cards and deck generation
//! - `effects`: card effect resolution
//! - `events`: typed events and the observer registry
//! - `schedule`: simulated-time task queue
//! - `rules`: engine, scoring, opponent policy, renderer seam

pub mod cards;
pub mod core;
pub mod effects;
pub mod events;
pub mod rules;
pub mod schedule;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, GameConfig, GamePhase, GameRng, GameState, HorseId, Placement, PlacementSide,
    PlayRecord, PlayerId, PlayerMap, Ranking, RankingError, Timing, TurnPhase,
};

pub use crate::cards::{ActionCard, Betting, CardId, CardKind, CardType, DeckGenerator, Direction};

pub use crate::effects::{CardResolver, Resolution};

pub use crate::events::{EventBus, EventKind, GameEvent, StateField, SubscriptionId};

pub use crate::schedule::Scheduler;

pub use crate::rules::{
    BetLine, CameraSettle, GameEngine, NullScene, OpponentPolicy, PlayerScore, Prompt,
    RandomOpponent, Scene, ScoreCalculator,
};
