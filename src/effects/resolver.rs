//! Card effect resolution.
//!
//! `CardResolver::resolve` maps a card and the current ranking to a new
//! ranking plus a message for the message box. The input ranking is never
//! touched; the output is a fresh permutation.
//!
//! Edge rules:
//! - A leader hit by `forward` drops back instead; a last-place horse hit by
//!   `backward` moves up instead.
//! - `plus_minus` honors the requested direction unless the horse is first
//!   (forced back) or last (forced forward).
//! - `multi_move` resolves one direction for both horses, then moves them
//!   one after the other in card order.

use crate::cards::{ActionCard, CardKind, Direction};
use crate::core::{GameRng, HorseId, Ranking};

/// Result of resolving one card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Ranking after the card.
    pub ranking: Ranking,
    /// Message describing what happened.
    pub message: String,
    /// The card asks for a betting exchange instead of moving horses.
    pub exchange: bool,
}

/// Resolves action cards against a ranking.
pub struct CardResolver;

impl CardResolver {
    /// Resolve `card` played by `actor`.
    ///
    /// `requested` is the direction chosen for a `plus_minus` card and is
    /// ignored by every other kind. `rng` picks a target for cards that lack
    /// one.
    pub fn resolve(
        card: &ActionCard,
        ranking: &Ranking,
        actor: &str,
        requested: Option<Direction>,
        rng: &mut GameRng,
    ) -> Resolution {
        let mut next = ranking.clone();

        let message = match &card.kind {
            CardKind::RiderFallOff => Self::rider_fall_off(&mut next, actor),

            CardKind::Forward { value, target } => {
                let horse = Self::target_or_random(*target, ranking, rng);
                Self::forward(&mut next, horse, *value, actor)
            }

            CardKind::Backward { value, target } => {
                let horse = Self::target_or_random(*target, ranking, rng);
                Self::backward(&mut next, horse, *value, actor)
            }

            CardKind::PlusMinus { value, target } => {
                let horse = Self::target_or_random(*target, ranking, rng);
                Self::plus_minus(&mut next, horse, *value, requested.unwrap_or_default(), actor)
            }

            CardKind::MultiMove { value, targets, direction } => {
                Self::multi_move(&mut next, *targets, *value, *direction, actor)
            }

            CardKind::ExchangeBetting => {
                return Resolution {
                    ranking: next,
                    message: format!("{actor}: betting exchange!"),
                    exchange: true,
                };
            }
        };

        Resolution {
            ranking: next,
            message,
            exchange: false,
        }
    }

    fn target_or_random(target: Option<HorseId>, ranking: &Ranking, rng: &mut GameRng) -> HorseId {
        target.unwrap_or_else(|| {
            let idx = rng.gen_range_usize(0..ranking.len());
            ranking.at(idx).unwrap_or_else(|| ranking.last())
        })
    }

    fn rider_fall_off(ranking: &mut Ranking, actor: &str) -> String {
        let slot = ranking.third_index();
        match ranking.at(slot) {
            Some(horse) => {
                ranking.move_to(horse, 0);
                format!("{actor}: third-place horse {horse} lost its rider!")
            }
            None => format!("{actor}: nobody fell off."),
        }
    }

    fn forward(ranking: &mut Ranking, horse: HorseId, value: u8, actor: &str) -> String {
        let Some(rank) = ranking.rank_of(horse) else {
            return Self::unknown_horse(horse, actor);
        };
        if rank == ranking.first_index() {
            ranking.shift(horse, Direction::Backward.offset(value));
            format!("{actor}: {horse} is already leading and drops back!")
        } else {
            ranking.shift(horse, Direction::Forward.offset(value));
            format!("{actor}: {horse} surges ahead!")
        }
    }

    fn backward(ranking: &mut Ranking, horse: HorseId, value: u8, actor: &str) -> String {
        let Some(rank) = ranking.rank_of(horse) else {
            return Self::unknown_horse(horse, actor);
        };
        if rank == 0 {
            ranking.shift(horse, Direction::Forward.offset(value));
            format!("{actor}: {horse} is last and moves up instead!")
        } else {
            ranking.shift(horse, Direction::Backward.offset(value));
            format!("{actor}: {horse} stumbles...")
        }
    }

    fn plus_minus(
        ranking: &mut Ranking,
        horse: HorseId,
        value: u8,
        requested: Direction,
        actor: &str,
    ) -> String {
        let Some(rank) = ranking.rank_of(horse) else {
            return Self::unknown_horse(horse, actor);
        };
        let (direction, message) = if rank == ranking.first_index() {
            (
                Direction::Backward,
                format!("{actor}: {horse} is leading, so it can only drop back!"),
            )
        } else if rank == 0 {
            (
                Direction::Forward,
                format!("{actor}: {horse} is last, so it can only move up!"),
            )
        } else {
            let verb = match requested {
                Direction::Forward => "moves up",
                Direction::Backward => "drops back",
            };
            (requested, format!("{actor}: {horse} {verb}!"))
        };
        ranking.shift(horse, direction.offset(value));
        message
    }

    fn multi_move(
        ranking: &mut Ranking,
        targets: [HorseId; 2],
        value: u8,
        stored: Direction,
        actor: &str,
    ) -> String {
        let first = ranking.first_index();
        let ranks: Vec<Option<usize>> = targets.iter().map(|&h| ranking.rank_of(h)).collect();

        let direction = if ranks.contains(&Some(first)) {
            Direction::Backward
        } else if ranks.contains(&Some(0)) {
            Direction::Forward
        } else {
            stored
        };

        // Sequential: the first move can shift the second horse's slot.
        for horse in targets {
            ranking.shift(horse, direction.offset(value));
        }

        let verb = match direction {
            Direction::Forward => "move up",
            Direction::Backward => "drop back",
        };
        format!("{actor}: {} and {} {verb} together!", targets[0], targets[1])
    }

    fn unknown_horse(horse: HorseId, actor: &str) -> String {
        format!("{actor}: horse {horse} is not in the race.")
    }
}
