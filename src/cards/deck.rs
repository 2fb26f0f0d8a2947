//! Deck and setup generation.
//!
//! Builds the action-card deck for a match, deals it out, and produces the
//! random ranking and betting assignments used when the betting and
//! placement phases do not decide them.

use smallvec::SmallVec;

use crate::core::{GameConfig, GameRng, HorseId, PlayerId, PlayerMap, Ranking};

use super::card::{ActionCard, CardId, CardKind, CardType, Direction};

/// A player's two betting horses.
pub type Betting = SmallVec<[HorseId; 2]>;

/// Generates decks, hands and random setup for a match.
pub struct DeckGenerator<'a> {
    config: &'a GameConfig,
}

impl<'a> DeckGenerator<'a> {
    #[must_use]
    pub fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    /// Generate `total_action_cards` cards with ids `0..total`.
    ///
    /// Each card's type is drawn uniformly from the enabled set, then its
    /// parameters are filled in for that type.
    pub fn generate(&self, rng: &mut GameRng) -> Vec<ActionCard> {
        (0..self.config.total_action_cards)
            .map(|i| {
                let card_type = rng
                    .choose(&self.config.card_types)
                    .copied()
                    .unwrap_or(CardType::Forward);
                ActionCard::new(CardId::new(i as u32), self.kind_for(card_type, rng))
            })
            .collect()
    }

    fn kind_for(&self, card_type: CardType, rng: &mut GameRng) -> CardKind {
        let horses: Vec<HorseId> = HorseId::all(self.config.horse_count).collect();
        let pick_horse = |rng: &mut GameRng| rng.choose(&horses).copied();

        match card_type {
            CardType::Forward => CardKind::Forward {
                value: rng.gen_range_u8(1..=2),
                target: pick_horse(rng),
            },
            CardType::Backward => CardKind::Backward {
                value: rng.gen_range_u8(1..=2),
                target: pick_horse(rng),
            },
            CardType::PlusMinus => CardKind::PlusMinus {
                value: rng.gen_range_u8(1..=2),
                target: pick_horse(rng),
            },
            CardType::RiderFallOff => CardKind::RiderFallOff,
            CardType::MultiMove => {
                let pair = rng.sample(&horses, 2);
                let direction = if rng.gen_bool(0.5) {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                CardKind::MultiMove {
                    value: rng.gen_range_u8(1..=2),
                    targets: [pair[0], pair[1]],
                    direction,
                }
            }
            CardType::ExchangeBetting => CardKind::ExchangeBetting,
        }
    }

    /// Split a deck into hands, `cards_per_player` each, in seat order.
    ///
    /// Cards left over after dealing are discarded.
    pub fn deal(&self, mut deck: Vec<ActionCard>) -> PlayerMap<Vec<ActionCard>> {
        let per_player = self.config.cards_per_player;
        let mut hands = PlayerMap::with_default(self.config.player_count);
        for player in PlayerId::all(self.config.player_count) {
            let take = per_player.min(deck.len());
            hands[player] = deck.drain(..take).collect();
        }
        hands
    }

    /// Uniformly shuffled ranking of every horse.
    pub fn shuffled_ranking(&self, rng: &mut GameRng) -> Ranking {
        let mut horses: Vec<HorseId> = HorseId::all(self.config.horse_count).collect();
        rng.shuffle(&mut horses);
        Ranking::from_vec(horses).unwrap_or_else(|_| Ranking::ordered(self.config.horse_count))
    }

    /// Two distinct random horses (shuffle, then take two).
    pub fn random_betting(&self, rng: &mut GameRng) -> Betting {
        let mut horses: Vec<HorseId> = HorseId::all(self.config.horse_count).collect();
        rng.shuffle(&mut horses);
        horses.into_iter().take(2).collect()
    }

    /// Betting for every seat.
    ///
    /// The human keeps `human_pick` when it holds exactly two horses;
    /// everyone else gets a random pair.
    pub fn bettings(&self, human_pick: Option<&[HorseId]>, rng: &mut GameRng) -> PlayerMap<Betting> {
        let mut bettings: PlayerMap<Betting> = PlayerMap::with_default(self.config.player_count);
        for player in PlayerId::all(self.config.player_count) {
            bettings[player] = match human_pick {
                Some(pick) if player.is_human() && pick.len() == 2 => pick.iter().copied().collect(),
                _ => self.random_betting(rng),
            };
        }
        bettings
    }
}
