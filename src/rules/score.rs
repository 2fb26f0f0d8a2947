//! Final standings.
//!
//! Each betting horse scores the rank-point value of its finishing slot. A
//! horse bet twice scores double, once. Tokens then add the bonus if the
//! dark horse finished in the top three, or the penalty if it did not.
//! Standings are sorted by total, highest first; ties keep seat order.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::Betting;
use crate::core::{GameConfig, HorseId, PlayerId, PlayerMap, Ranking};

/// Points earned from one distinct betting horse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLine {
    pub horse: HorseId,
    /// Times the player bet on this horse.
    pub count: u8,
    pub points: i64,
}

impl std::fmt::Display for BetLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count > 1 {
            write!(f, "{}x{} ({} pts)", self.horse, self.count, self.points)
        } else {
            write!(f, "{} ({} pts)", self.horse, self.points)
        }
    }
}

/// One row of the final standings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: PlayerId,
    pub name: String,
    pub score: i64,
    pub token_bonus: i64,
    pub breakdown: Vec<BetLine>,
    pub is_player: bool,
}

impl PlayerScore {
    /// Per-horse breakdown as one line.
    #[must_use]
    pub fn betting_info(&self) -> String {
        self.breakdown
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Scoring constants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreCalculator {
    rank_points: Vec<i64>,
    token_bonus: i64,
    token_penalty: i64,
}

impl ScoreCalculator {
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            rank_points: config.rank_points.clone(),
            token_bonus: config.token_bonus,
            token_penalty: config.token_penalty,
        }
    }

    fn points_for(&self, ranking: &Ranking, horse: HorseId) -> i64 {
        ranking
            .rank_of(horse)
            .and_then(|rank| self.rank_points.get(rank))
            .copied()
            .unwrap_or(0)
    }

    /// Score every seat and sort the standings.
    ///
    /// A missing dark horse counts as outside the top three.
    #[must_use]
    pub fn calculate(
        &self,
        ranking: &Ranking,
        bettings: &PlayerMap<Betting>,
        tokens: &PlayerMap<u32>,
        dark_horse: Option<HorseId>,
    ) -> Vec<PlayerScore> {
        let dh_in_top_three = dark_horse.is_some_and(|horse| ranking.in_top_three(horse));

        let mut results: Vec<PlayerScore> = bettings
            .iter()
            .map(|(player, betting)| {
                let breakdown = self.breakdown(ranking, betting);
                let held = i64::from(*tokens.get(player));
                let token_bonus = if dh_in_top_three {
                    held * self.token_bonus
                } else {
                    held * self.token_penalty
                };
                let score = breakdown.iter().map(|line| line.points).sum::<i64>() + token_bonus;

                PlayerScore {
                    player,
                    name: display_name(player),
                    score,
                    token_bonus,
                    breakdown,
                    is_player: player.is_human(),
                }
            })
            .collect();

        // Stable: equal scores keep seat order.
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }

    fn breakdown(&self, ranking: &Ranking, betting: &[HorseId]) -> Vec<BetLine> {
        let mut counts: FxHashMap<HorseId, u8> = FxHashMap::default();
        for &horse in betting {
            *counts.entry(horse).or_insert(0) += 1;
        }

        let mut lines = Vec::with_capacity(counts.len());
        for &horse in betting {
            let Some(count) = counts.remove(&horse) else {
                continue;
            };
            lines.push(BetLine {
                horse,
                count,
                points: self.points_for(ranking, horse) * i64::from(count),
            });
        }
        lines
    }
}

fn display_name(player: PlayerId) -> String {
    if player.is_human() {
        "Player (You)".to_string()
    } else {
        format!("AI Player {}", player.index())
    }
}
