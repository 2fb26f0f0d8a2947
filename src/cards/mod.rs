//! Action cards and deck generation.
//!
//! ## Key Types
//!
//! - `ActionCard`: a card in hand, identified by `CardId`
//! - `CardKind`: effect and parameters, one variant per `CardType`
//! - `DeckGenerator`: builds and deals decks, rankings and bettings
//! - `Betting`: the two horses a player backs

pub mod card;
pub mod deck;

pub use card::{ActionCard, CardId, CardKind, CardType, Direction};
pub use deck::{Betting, DeckGenerator};
