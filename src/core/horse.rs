//! Horses and the race ranking.
//!
//! ## HorseId
//!
//! Horses are identified by integers starting at 1. A horse has no state of
//! its own; where it stands in the race is encoded by its slot in a
//! [`Ranking`].
//!
//! ## Ranking
//!
//! An ordered permutation of every horse id. Index 0 is last place and the
//! final index is first place:
//!
//! ```
//! use dark_horse::core::{HorseId, Ranking};
//!
//! let ranking = Ranking::from_vec(vec![3, 1, 2].into_iter().map(HorseId::new).collect()).unwrap();
//! assert_eq!(ranking.leader(), HorseId::new(2));
//! assert_eq!(ranking.last(), HorseId::new(3));
//! assert_eq!(ranking.rank_of(HorseId::new(1)), Some(1));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Horse identifier (1-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HorseId(pub u8);

impl HorseId {
    /// Create a new horse ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Iterate over all horse IDs for a race with `horse_count` horses.
    pub fn all(horse_count: usize) -> impl Iterator<Item = HorseId> {
        (1..=horse_count as u8).map(HorseId)
    }
}

impl std::fmt::Display for HorseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a horse sequence is not a valid ranking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankingError {
    #[error("ranking must contain at least 1 horse")]
    Empty,
    #[error("horse {horse} is outside 1..={count}")]
    OutOfRange { horse: u8, count: usize },
    #[error("horse {horse} appears more than once")]
    Duplicate { horse: u8 },
}

/// Race order, index 0 = last place, `len - 1` = first place.
///
/// Always a permutation of `1..=len`. The only mutation is
/// [`Ranking::move_to`], which removes a horse and reinserts it, so the
/// permutation property cannot be broken from outside.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ranking {
    order: Vec<HorseId>,
}

impl Ranking {
    /// Identity ranking `[1, 2, ..., horse_count]`.
    #[must_use]
    pub fn ordered(horse_count: usize) -> Self {
        Self {
            order: HorseId::all(horse_count).collect(),
        }
    }

    /// Validate and wrap an explicit order.
    pub fn from_vec(order: Vec<HorseId>) -> Result<Self, RankingError> {
        if order.is_empty() {
            return Err(RankingError::Empty);
        }

        let count = order.len();
        let mut seen = vec![false; count];
        for horse in &order {
            let idx = (horse.0 as usize)
                .checked_sub(1)
                .filter(|&i| i < count)
                .ok_or(RankingError::OutOfRange { horse: horse.0, count })?;
            if seen[idx] {
                return Err(RankingError::Duplicate { horse: horse.0 });
            }
            seen[idx] = true;
        }

        Ok(Self { order })
    }

    /// Number of horses in the race.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false for a constructed ranking.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Rank index of first place.
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.order.len() - 1
    }

    /// Rank index of third place (the rider-fall-off slot).
    #[must_use]
    pub fn third_index(&self) -> usize {
        self.order.len().saturating_sub(3)
    }

    /// Horse in first place.
    #[must_use]
    pub fn leader(&self) -> HorseId {
        self.order[self.first_index()]
    }

    /// Horse in last place.
    #[must_use]
    pub fn last(&self) -> HorseId {
        self.order[0]
    }

    /// Horse at a rank index.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<HorseId> {
        self.order.get(index).copied()
    }

    /// Rank index of a horse.
    #[must_use]
    pub fn rank_of(&self, horse: HorseId) -> Option<usize> {
        self.order.iter().position(|&h| h == horse)
    }

    /// True if the horse finishes among the top three.
    #[must_use]
    pub fn in_top_three(&self, horse: HorseId) -> bool {
        self.rank_of(horse).is_some_and(|rank| rank >= self.third_index())
    }

    /// Move a horse to `index`, clamped to the valid range.
    ///
    /// Horses between the old and new slot shift by one.
    /// Returns the index the horse ended up at.
    pub fn move_to(&mut self, horse: HorseId, index: usize) -> Option<usize> {
        let current = self.rank_of(horse)?;
        let target = index.min(self.first_index());
        self.order.remove(current);
        self.order.insert(target, horse);
        Some(target)
    }

    /// Move a horse by a signed offset (positive = toward first place).
    pub fn shift(&mut self, horse: HorseId, offset: i32) -> Option<usize> {
        let current = self.rank_of(horse)? as i32;
        let target = (current + offset).clamp(0, self.first_index() as i32);
        self.move_to(horse, target as usize)
    }

    /// Horses from last place to first.
    #[must_use]
    pub fn as_slice(&self) -> &[HorseId] {
        &self.order
    }

    /// Iterate from last place to first.
    pub fn iter(&self) -> impl Iterator<Item = HorseId> + '_ {
        self.order.iter().copied()
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.order.iter().rev().map(ToString::to_string).collect();
        write!(f, "[{}]", names.join(" > "))
    }
}
