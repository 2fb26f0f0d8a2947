//! Game event types.
//!
//! Everything observers can learn about a match arrives as a [`GameEvent`].
//! Field-level notifications come from Game State mutators; lifecycle
//! events come from the engine.

use serde::{Deserialize, Serialize};

use crate::cards::{ActionCard, Betting};
use crate::core::{GamePhase, HorseId, PlacementSide, PlayerId, Ranking, TurnPhase};
use crate::rules::PlayerScore;

/// Game State field that changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StateField {
    Turn { old: PlayerId, new: PlayerId },
    TurnPhase { old: TurnPhase, new: TurnPhase },
    GamePhase { old: GamePhase, new: GamePhase },
    HorseOrder { old: Ranking, new: Ranking },
    DarkHorse(HorseId),
    Hand { player: PlayerId, size: usize },
    Betting { player: PlayerId, horses: Betting },
    TokensAvailable(u32),
    Tokens { player: PlayerId, count: u32 },
    IsAnimating(bool),
    IsGameOver(bool),
    BettingSelection(Betting),
    PlacementSelection(Option<HorseId>),
    Placement {
        available: Vec<HorseId>,
        placed: Vec<HorseId>,
    },
}

/// Something that happened during a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// One field of Game State changed.
    FieldChanged(StateField),
    /// Aggregate notification sent after every `FieldChanged`.
    StateChanged,

    /// Deck dealt and race ready.
    GameInitialized { dark_horse: HorseId, ranking: Ranking },
    StartMessage { message: String },
    CardPlayed {
        player: PlayerId,
        card: ActionCard,
        message: String,
        is_human: bool,
    },
    TokenTaken { player: PlayerId, is_human: bool },
    TokenSkipped { player: PlayerId, is_human: bool },
    TurnChanged { turn: PlayerId, phase: TurnPhase },
    PlayerTurnStarted { phase: TurnPhase },
    /// Text for the message box.
    Notice { message: String, is_human: bool },

    BettingSelectionChanged { selection: Betting },
    BettingConfirmed { horses: Betting },
    PlacementTurn { player: PlayerId },
    HorsePlaced {
        player: PlayerId,
        horse: HorseId,
        side: PlacementSide,
    },
    PlacementCompleted { dark_horse: HorseId, ranking: Ranking },

    /// Waiting for the human to pick an exchange.
    ExchangeRequested { player: PlayerId },
    BettingExchanged {
        player: PlayerId,
        target: PlayerId,
        given: HorseId,
        received: HorseId,
    },

    RaceFinishing { winner: HorseId },
    RaceFinished { results: Vec<PlayerScore> },
}

/// Discriminant used to subscribe to one kind of event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    FieldChanged,
    StateChanged,
    GameInitialized,
    StartMessage,
    CardPlayed,
    TokenTaken,
    TokenSkipped,
    TurnChanged,
    PlayerTurnStarted,
    Notice,
    BettingSelectionChanged,
    BettingConfirmed,
    PlacementTurn,
    HorsePlaced,
    PlacementCompleted,
    ExchangeRequested,
    BettingExchanged,
    RaceFinishing,
    RaceFinished,
}

impl GameEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::FieldChanged(_) => EventKind::FieldChanged,
            GameEvent::StateChanged => EventKind::StateChanged,
            GameEvent::GameInitialized { .. } => EventKind::GameInitialized,
            GameEvent::StartMessage { .. } => EventKind::StartMessage,
            GameEvent::CardPlayed { .. } => EventKind::CardPlayed,
            GameEvent::TokenTaken { .. } => EventKind::TokenTaken,
            GameEvent::TokenSkipped { .. } => EventKind::TokenSkipped,
            GameEvent::TurnChanged { .. } => EventKind::TurnChanged,
            GameEvent::PlayerTurnStarted { .. } => EventKind::PlayerTurnStarted,
            GameEvent::Notice { .. } => EventKind::Notice,
            GameEvent::BettingSelectionChanged { .. } => EventKind::BettingSelectionChanged,
            GameEvent::BettingConfirmed { .. } => EventKind::BettingConfirmed,
            GameEvent::PlacementTurn { .. } => EventKind::PlacementTurn,
            GameEvent::HorsePlaced { .. } => EventKind::HorsePlaced,
            GameEvent::PlacementCompleted { .. } => EventKind::PlacementCompleted,
            GameEvent::ExchangeRequested { .. } => EventKind::ExchangeRequested,
            GameEvent::BettingExchanged { .. } => EventKind::BettingExchanged,
            GameEvent::RaceFinishing { .. } => EventKind::RaceFinishing,
            GameEvent::RaceFinished { .. } => EventKind::RaceFinished,
        }
    }
}
