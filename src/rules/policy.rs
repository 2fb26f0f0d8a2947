//! Computer opponent decisions.
//!
//! The engine asks an `OpponentPolicy` whenever a non-human seat has to
//! decide something. `RandomOpponent` reproduces the stock behavior: grab a
//! token with a fixed probability, otherwise pick uniformly.

use crate::cards::{ActionCard, CardId, CardKind, Direction};
use crate::core::{GameRng, GameState, HorseId, PlacementSide, PlayerId};

/// Decision hooks for a computer-controlled seat.
pub trait OpponentPolicy {
    /// Take the dark-horse token this turn? Only asked when taking is legal.
    fn wants_token(&self, state: &GameState, player: PlayerId, rng: &mut GameRng) -> bool;

    /// Card to play from `hand`. `None` only for an empty hand.
    fn choose_card(&self, hand: &[ActionCard], rng: &mut GameRng) -> Option<CardId>;

    /// Direction request for a card that takes one.
    fn choose_direction(&self, card: &ActionCard, rng: &mut GameRng) -> Option<Direction>;

    /// Betting swap as `(target, own_slot, their_slot)`.
    fn choose_exchange(
        &self,
        state: &GameState,
        player: PlayerId,
        rng: &mut GameRng,
    ) -> Option<(PlayerId, usize, usize)>;

    /// Horse to place and which end of the row it joins.
    fn choose_placement(
        &self,
        available: &[HorseId],
        rng: &mut GameRng,
    ) -> Option<(HorseId, PlacementSide)>;
}

/// Uniformly random opponent.
#[derive(Clone, Debug)]
pub struct RandomOpponent {
    token_probability: f64,
}

impl RandomOpponent {
    #[must_use]
    pub fn new(token_probability: f64) -> Self {
        Self {
            token_probability: token_probability.clamp(0.0, 1.0),
        }
    }
}

impl Default for RandomOpponent {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl OpponentPolicy for RandomOpponent {
    fn wants_token(&self, _state: &GameState, _player: PlayerId, rng: &mut GameRng) -> bool {
        rng.gen_bool(self.token_probability)
    }

    fn choose_card(&self, hand: &[ActionCard], rng: &mut GameRng) -> Option<CardId> {
        rng.choose(hand).map(|card| card.id)
    }

    fn choose_direction(&self, card: &ActionCard, rng: &mut GameRng) -> Option<Direction> {
        match card.kind {
            CardKind::PlusMinus { .. } => Some(if rng.gen_bool(0.5) {
                Direction::Forward
            } else {
                Direction::Backward
            }),
            _ => None,
        }
    }

    fn choose_exchange(
        &self,
        state: &GameState,
        player: PlayerId,
        rng: &mut GameRng,
    ) -> Option<(PlayerId, usize, usize)> {
        let others: Vec<PlayerId> = PlayerId::all(state.player_count())
            .filter(|&p| p != player && !state.betting(p).is_empty())
            .collect();
        let target = *rng.choose(&others)?;

        let own = state.betting(player).len();
        let theirs = state.betting(target).len();
        if own == 0 {
            return None;
        }
        Some((target, rng.gen_range_usize(0..own), rng.gen_range_usize(0..theirs)))
    }

    fn choose_placement(
        &self,
        available: &[HorseId],
        rng: &mut GameRng,
    ) -> Option<(HorseId, PlacementSide)> {
        let horse = *rng.choose(available)?;
        let side = if rng.gen_bool(0.5) {
            PlacementSide::Left
        } else {
            PlacementSide::Right
        };
        Some((horse, side))
    }
}
