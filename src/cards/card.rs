//! Action cards.
//!
//! A card's payload lives in its [`CardKind`] variant, so a rider-fall-off
//! card cannot carry a target and a multi-move card always names exactly
//! two horses.

use serde::{Deserialize, Serialize};

use crate::core::HorseId;

/// Card identifier, unique within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Movement direction along the ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward first place.
    #[default]
    Forward,
    /// Toward last place.
    Backward,
}

impl Direction {
    /// Signed rank offset for a move of `value` slots.
    #[must_use]
    pub fn offset(self, value: u8) -> i32 {
        match self {
            Direction::Forward => value as i32,
            Direction::Backward => -(value as i32),
        }
    }
}

/// Card type tag, used for the generator's enabled set and for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Forward,
    Backward,
    PlusMinus,
    RiderFallOff,
    MultiMove,
    ExchangeBetting,
}

impl CardType {
    /// Every card type, in catalog order.
    pub const ALL: [CardType; 6] = [
        CardType::Forward,
        CardType::Backward,
        CardType::PlusMinus,
        CardType::RiderFallOff,
        CardType::MultiMove,
        CardType::ExchangeBetting,
    ];

    /// Catalog name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CardType::Forward => "forward",
            CardType::Backward => "backward",
            CardType::PlusMinus => "plus_minus",
            CardType::RiderFallOff => "rider_fall_off",
            CardType::MultiMove => "multi_move",
            CardType::ExchangeBetting => "exchange_betting",
        }
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Card effect and its parameters.
///
/// Single-target kinds keep `Option<HorseId>`: a card without a target
/// picks one at random when it resolves. Generated decks always fill it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardKind {
    /// Advance `value` slots; a leader is pushed back instead.
    Forward { value: u8, target: Option<HorseId> },
    /// Drop `value` slots; the last horse moves up instead.
    Backward { value: u8, target: Option<HorseId> },
    /// Move `value` slots in a direction chosen when played.
    PlusMinus { value: u8, target: Option<HorseId> },
    /// Third place falls to last.
    RiderFallOff,
    /// Two horses move `value` slots in one shared direction.
    MultiMove {
        value: u8,
        targets: [HorseId; 2],
        direction: Direction,
    },
    /// Swap one betting card with another player.
    ExchangeBetting,
}

impl CardKind {
    #[must_use]
    pub fn card_type(&self) -> CardType {
        match self {
            CardKind::Forward { .. } => CardType::Forward,
            CardKind::Backward { .. } => CardType::Backward,
            CardKind::PlusMinus { .. } => CardType::PlusMinus,
            CardKind::RiderFallOff => CardType::RiderFallOff,
            CardKind::MultiMove { .. } => CardType::MultiMove,
            CardKind::ExchangeBetting => CardType::ExchangeBetting,
        }
    }
}

/// A card in a player's hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCard {
    pub id: CardId,
    pub kind: CardKind,
}

impl ActionCard {
    /// Create a new card.
    #[must_use]
    pub fn new(id: CardId, kind: CardKind) -> Self {
        Self { id, kind }
    }

    /// Forward card aimed at `target`.
    #[must_use]
    pub fn forward(id: u32, value: u8, target: HorseId) -> Self {
        Self::new(CardId::new(id), CardKind::Forward { value, target: Some(target) })
    }

    /// Backward card aimed at `target`.
    #[must_use]
    pub fn backward(id: u32, value: u8, target: HorseId) -> Self {
        Self::new(CardId::new(id), CardKind::Backward { value, target: Some(target) })
    }

    /// Plus/minus card aimed at `target`.
    #[must_use]
    pub fn plus_minus(id: u32, value: u8, target: HorseId) -> Self {
        Self::new(CardId::new(id), CardKind::PlusMinus { value, target: Some(target) })
    }

    #[must_use]
    pub fn rider_fall_off(id: u32) -> Self {
        Self::new(CardId::new(id), CardKind::RiderFallOff)
    }

    #[must_use]
    pub fn multi_move(id: u32, value: u8, targets: [HorseId; 2], direction: Direction) -> Self {
        Self::new(
            CardId::new(id),
            CardKind::MultiMove { value, targets, direction },
        )
    }

    #[must_use]
    pub fn exchange_betting(id: u32) -> Self {
        Self::new(CardId::new(id), CardKind::ExchangeBetting)
    }

    #[must_use]
    pub fn card_type(&self) -> CardType {
        self.kind.card_type()
    }
}

impl std::fmt::Display for ActionCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            CardKind::Forward { value, target }
            | CardKind::Backward { value, target }
            | CardKind::PlusMinus { value, target } => match target {
                Some(horse) => write!(f, "{} {} {}", self.card_type(), value, horse),
                None => write!(f, "{} {}", self.card_type(), value),
            },
            CardKind::MultiMove { value, targets, direction } => write!(
                f,
                "multi_move {} {}+{} {:?}",
                value, targets[0], targets[1], direction
            ),
            CardKind::RiderFallOff | CardKind::ExchangeBetting => {
                write!(f, "{}", self.card_type())
            }
        }
    }
}
