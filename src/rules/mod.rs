//! Match rules: scoring, opponents, the renderer seam and the engine.
//!
//! - `GameEngine`: phase and turn state machine
//! - `ScoreCalculator`: final standings
//! - `OpponentPolicy`: how computer seats decide
//! - `Scene`: what the engine asks of a renderer

pub mod engine;
pub mod policy;
pub mod scene;
pub mod score;

pub use engine::{GameEngine, Prompt};
pub use policy::{OpponentPolicy, RandomOpponent};
pub use scene::{CameraSettle, NullScene, Scene};
pub use score::{BetLine, PlayerScore, ScoreCalculator};
