//! Renderer collaborator.
//!
//! The engine drives a `Scene` but never waits on it, except for the
//! camera move at race end: scoring runs once the camera settles.

use crate::core::{HorseId, Ranking};

/// When the finish camera settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraSettle {
    /// After this many milliseconds of simulated time.
    After(u64),
    /// The host reports it through `GameEngine::camera_settled`.
    Deferred,
}

/// What the engine needs from a renderer.
pub trait Scene {
    /// Move horse models to match the ranking.
    fn update_horse_positions(&mut self, ranking: &Ranking);

    /// Start the finish camera on the winner.
    fn animate_camera(&mut self, winner: HorseId) -> CameraSettle;
}

/// Headless scene: nothing to draw, camera settles immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullScene;

impl Scene for NullScene {
    fn update_horse_positions(&mut self, _ranking: &Ranking) {}

    fn animate_camera(&mut self, _winner: HorseId) -> CameraSettle {
        CameraSettle::After(0)
    }
}
