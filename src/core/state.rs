//! Game state: the single source of truth for a match.
//!
//! ## Ownership
//!
//! The engine owns one `GameState`. Everything else reads it through
//! accessors; every write goes through a method here so the change
//! notification contract holds: one `FieldChanged` per changed field,
//! each followed by one `StateChanged`.
//!
//! ## Lifecycle
//!
//! - Created at match start with the opening seat and empty hands
//! - Betting and placement helpers fill in the human's pick, the ranking
//!   and the dark horse
//! - Hands and bettings are dealt when play starts
//! - Frozen by `finish_game` (`is_game_over`)

use im::Vector;
use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use super::horse::{HorseId, Ranking};
use super::player::{PlayerId, PlayerMap};
use crate::cards::{ActionCard, Betting, CardId};
use crate::events::{EventBus, EventKind, GameEvent, StateField, SubscriptionId};

/// Sub-phase of a player's turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// May take a dark-horse token or skip.
    #[default]
    Token,
    /// Must play one card.
    Card,
}

/// Match-level phase, traversed once in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Betting,
    Placement,
    Playing,
}

/// Which end of the placed row a horse joins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementSide {
    /// Head of the row: worse placement.
    Left,
    /// Tail of the row: better placement.
    Right,
}

/// Outcome of `place_horse_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// No horse selected; nothing happened.
    Rejected,
    /// Horse placed, more remain.
    Placed(HorseId),
    /// Horse placed and the last horse became the dark horse.
    Completed { placed: HorseId, dark_horse: HorseId },
}

/// One resolved card play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub player: PlayerId,
    pub card: ActionCard,
    pub message: String,
    pub sequence: u32,
}

/// Authoritative match state.
#[derive(Debug)]
pub struct GameState {
    player_count: usize,
    horse_count: usize,

    turn: PlayerId,
    turn_phase: TurnPhase,
    game_phase: GamePhase,

    /// Placeholder identity order until setup or placement fixes it.
    horse_order: Ranking,
    dark_horse: Option<HorseId>,

    hands: PlayerMap<Vec<ActionCard>>,
    bettings: PlayerMap<Betting>,

    tokens_available: u32,
    tokens: PlayerMap<u32>,

    is_animating: bool,
    is_game_over: bool,

    betting_selection: Betting,
    available_horses: Vec<HorseId>,
    placed_horses: Vec<HorseId>,
    placement_selection: Option<HorseId>,
    placement_turn: PlayerId,

    history: Vector<PlayRecord>,
    bus: EventBus,
}

impl GameState {
    /// Create the state for a new match with `first_turn` opening play.
    #[must_use]
    pub fn new(config: &GameConfig, first_turn: PlayerId) -> Self {
        Self {
            player_count: config.player_count,
            horse_count: config.horse_count,
            turn: first_turn,
            turn_phase: TurnPhase::Token,
            game_phase: GamePhase::Betting,
            horse_order: Ranking::ordered(config.horse_count),
            dark_horse: None,
            hands: PlayerMap::with_default(config.player_count),
            bettings: PlayerMap::with_default(config.player_count),
            tokens_available: config.dark_horse_tokens,
            tokens: PlayerMap::with_value(config.player_count, 0),
            is_animating: false,
            is_game_over: false,
            betting_selection: Betting::new(),
            available_horses: HorseId::all(config.horse_count).collect(),
            placed_horses: Vec::new(),
            placement_selection: None,
            placement_turn: PlayerId::HUMAN,
            history: Vector::new(),
            bus: EventBus::new(),
        }
    }

    // === Notifications ===

    fn notify(&mut self, field: StateField) {
        self.bus.emit(&GameEvent::FieldChanged(field));
        self.bus.emit(&GameEvent::StateChanged);
    }

    /// Deliver a lifecycle event to observers.
    pub fn emit(&mut self, event: GameEvent) {
        self.bus.emit(&event);
    }

    /// Observe every event.
    pub fn subscribe(&mut self, handler: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(handler)
    }

    /// Observe one kind of event.
    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe_to(kind, handler)
    }

    /// Direct access to the observer registry.
    pub fn events(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    // === Accessors ===

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    #[must_use]
    pub fn horse_count(&self) -> usize {
        self.horse_count
    }

    #[must_use]
    pub fn turn(&self) -> PlayerId {
        self.turn
    }

    /// True when the human holds the turn.
    #[must_use]
    pub fn is_human_turn(&self) -> bool {
        self.turn.is_human()
    }

    #[must_use]
    pub fn turn_phase(&self) -> TurnPhase {
        self.turn_phase
    }

    #[must_use]
    pub fn game_phase(&self) -> GamePhase {
        self.game_phase
    }

    #[must_use]
    pub fn horse_order(&self) -> &Ranking {
        &self.horse_order
    }

    #[must_use]
    pub fn dark_horse(&self) -> Option<HorseId> {
        self.dark_horse
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> &[ActionCard] {
        &self.hands[player]
    }

    #[must_use]
    pub fn betting(&self, player: PlayerId) -> &[HorseId] {
        &self.bettings[player]
    }

    #[must_use]
    pub fn bettings(&self) -> &PlayerMap<Betting> {
        &self.bettings
    }

    #[must_use]
    pub fn tokens_available(&self) -> u32 {
        self.tokens_available
    }

    #[must_use]
    pub fn tokens(&self, player: PlayerId) -> u32 {
        self.tokens[player]
    }

    #[must_use]
    pub fn token_counts(&self) -> &PlayerMap<u32> {
        &self.tokens
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    #[must_use]
    pub fn betting_selection(&self) -> &[HorseId] {
        &self.betting_selection
    }

    #[must_use]
    pub fn available_horses(&self) -> &[HorseId] {
        &self.available_horses
    }

    #[must_use]
    pub fn placed_horses(&self) -> &[HorseId] {
        &self.placed_horses
    }

    #[must_use]
    pub fn placement_selection(&self) -> Option<HorseId> {
        self.placement_selection
    }

    #[must_use]
    pub fn placement_turn(&self) -> PlayerId {
        self.placement_turn
    }

    /// Resolved plays, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<PlayRecord> {
        &self.history
    }

    // === Turn ===

    /// Advance to the next seat. No validity checks.
    pub fn next_turn(&mut self) {
        self.set_turn(self.turn.next(self.player_count));
    }

    pub fn set_turn(&mut self, player: PlayerId) {
        let old = self.turn;
        if old == player {
            return;
        }
        self.turn = player;
        self.notify(StateField::Turn { old, new: player });
    }

    pub fn set_turn_phase(&mut self, phase: TurnPhase) {
        let old = self.turn_phase;
        if old == phase {
            return;
        }
        self.turn_phase = phase;
        self.notify(StateField::TurnPhase { old, new: phase });
    }

    /// Move to a later match phase. Returns false (and changes nothing) for
    /// the current or an earlier phase.
    pub fn advance_game_phase(&mut self, phase: GamePhase) -> bool {
        if phase <= self.game_phase {
            return false;
        }
        let old = self.game_phase;
        self.game_phase = phase;
        self.notify(StateField::GamePhase { old, new: phase });
        true
    }

    // === Race ===

    pub fn set_horse_order(&mut self, ranking: Ranking) {
        let old = std::mem::replace(&mut self.horse_order, ranking);
        let new = self.horse_order.clone();
        self.notify(StateField::HorseOrder { old, new });
    }

    /// Fix the dark horse. Returns false if it was already set.
    pub fn set_dark_horse(&mut self, horse: HorseId) -> bool {
        if self.dark_horse.is_some() {
            return false;
        }
        self.dark_horse = Some(horse);
        self.notify(StateField::DarkHorse(horse));
        true
    }

    // === Hands ===

    pub fn set_hands(&mut self, hands: PlayerMap<Vec<ActionCard>>) {
        self.hands = hands;
        for player in PlayerId::all(self.player_count) {
            let size = self.hands[player].len();
            self.notify(StateField::Hand { player, size });
        }
    }

    /// Remove and return the first card with `card_id` from a hand.
    ///
    /// `None` means the card is not (or no longer) in that hand.
    pub fn remove_card(&mut self, player: PlayerId, card_id: CardId) -> Option<ActionCard> {
        let pos = self.hands[player].iter().position(|c| c.id == card_id)?;
        let card = self.hands[player].remove(pos);
        let size = self.hands[player].len();
        self.notify(StateField::Hand { player, size });
        Some(card)
    }

    #[must_use]
    pub fn total_cards_remaining(&self) -> usize {
        self.hands.values().map(Vec::len).sum()
    }

    // === Tokens ===

    /// A token is left, the player holds none, and taking one still leaves
    /// a card to play afterwards.
    #[must_use]
    pub fn can_take_token(&self, player: PlayerId) -> bool {
        self.tokens_available > 0 && self.tokens[player] == 0 && self.hands[player].len() > 1
    }

    /// Move one token from the pool to the player, if allowed.
    pub fn take_token(&mut self, player: PlayerId) -> bool {
        if !self.can_take_token(player) {
            return false;
        }
        self.tokens_available -= 1;
        self.tokens[player] += 1;
        self.notify(StateField::TokensAvailable(self.tokens_available));
        self.notify(StateField::Tokens {
            player,
            count: self.tokens[player],
        });
        true
    }

    // === Flags ===

    pub fn set_animating(&mut self, animating: bool) {
        if self.is_animating == animating {
            return;
        }
        self.is_animating = animating;
        self.notify(StateField::IsAnimating(animating));
    }

    /// Freeze the match. Returns false if it was already over.
    pub fn set_game_over(&mut self) -> bool {
        if self.is_game_over {
            return false;
        }
        self.is_game_over = true;
        self.notify(StateField::IsGameOver(true));
        true
    }

    // === Betting ===

    /// Toggle a horse in the human's betting selection.
    ///
    /// Selecting a third horse evicts the oldest pick.
    pub fn toggle_betting_horse(&mut self, horse: HorseId) {
        if let Some(pos) = self.betting_selection.iter().position(|&h| h == horse) {
            self.betting_selection.remove(pos);
        } else {
            if self.betting_selection.len() >= 2 {
                self.betting_selection.remove(0);
            }
            self.betting_selection.push(horse);
        }
        self.notify(StateField::BettingSelection(self.betting_selection.clone()));
    }

    pub fn clear_betting_selection(&mut self) {
        self.betting_selection.clear();
        self.notify(StateField::BettingSelection(Betting::new()));
    }

    /// Commit the human's selection as their betting. Needs exactly two picks.
    pub fn confirm_betting(&mut self) -> Option<Betting> {
        if self.betting_selection.len() != 2 {
            return None;
        }
        let horses = self.betting_selection.clone();
        self.set_betting(PlayerId::HUMAN, horses.clone());
        Some(horses)
    }

    pub fn set_betting(&mut self, player: PlayerId, horses: Betting) {
        self.bettings[player] = horses.clone();
        self.notify(StateField::Betting { player, horses });
    }

    pub fn set_bettings(&mut self, bettings: PlayerMap<Betting>) {
        for (player, horses) in bettings.iter() {
            self.set_betting(player, horses.clone());
        }
    }

    /// Swap `player`'s betting slot with `target`'s.
    ///
    /// Returns `(given, received)` from `player`'s point of view, or `None`
    /// when the players are the same or a slot does not exist.
    pub fn exchange_betting(
        &mut self,
        player: PlayerId,
        own_slot: usize,
        target: PlayerId,
        their_slot: usize,
    ) -> Option<(HorseId, HorseId)> {
        if player == target || target.index() >= self.player_count {
            return None;
        }
        let given = *self.bettings[player].get(own_slot)?;
        let received = *self.bettings[target].get(their_slot)?;

        self.bettings[player][own_slot] = received;
        self.bettings[target][their_slot] = given;

        let (mine, theirs) = (self.bettings[player].clone(), self.bettings[target].clone());
        self.notify(StateField::Betting { player, horses: mine });
        self.notify(StateField::Betting { player: target, horses: theirs });
        Some((given, received))
    }

    // === Placement ===

    /// Pick an unplaced horse. Returns false if it is not available.
    pub fn select_placement_horse(&mut self, horse: HorseId) -> bool {
        if !self.available_horses.contains(&horse) {
            return false;
        }
        self.placement_selection = Some(horse);
        self.notify(StateField::PlacementSelection(Some(horse)));
        true
    }

    /// Place the selected horse at one end of the placed row.
    ///
    /// When exactly one horse is left afterwards it becomes the dark horse
    /// and the ranking is fixed as `[dark_horse, placed...]`.
    pub fn place_horse_at(&mut self, side: PlacementSide) -> Placement {
        let Some(horse) = self.placement_selection.take() else {
            return Placement::Rejected;
        };
        let Some(pos) = self.available_horses.iter().position(|&h| h == horse) else {
            return Placement::Rejected;
        };

        self.available_horses.remove(pos);
        match side {
            PlacementSide::Left => self.placed_horses.insert(0, horse),
            PlacementSide::Right => self.placed_horses.push(horse),
        }
        self.notify(StateField::PlacementSelection(None));
        self.notify(StateField::Placement {
            available: self.available_horses.clone(),
            placed: self.placed_horses.clone(),
        });

        if self.available_horses.len() != 1 {
            return Placement::Placed(horse);
        }

        let dark_horse = self.available_horses[0];
        let order: Vec<HorseId> = std::iter::once(dark_horse)
            .chain(self.placed_horses.iter().copied())
            .collect();
        match Ranking::from_vec(order) {
            Ok(ranking) => {
                self.set_dark_horse(dark_horse);
                self.set_horse_order(ranking);
                Placement::Completed { placed: horse, dark_horse }
            }
            Err(_) => Placement::Placed(horse),
        }
    }

    /// Hand the placement turn to the next seat.
    pub fn advance_placement_turn(&mut self) {
        self.placement_turn = self.placement_turn.next(self.player_count);
    }

    // === History ===

    /// Append a resolved play, numbering it.
    pub fn record_play(&mut self, player: PlayerId, card: ActionCard, message: String) {
        let sequence = self.history.len() as u32;
        self.history.push_back(PlayRecord {
            player,
            card,
            message,
            sequence,
        });
    }
}
