//! Game engine: the match state machine.
//!
//! Drives `betting → placement → playing`, then the per-turn
//! `token → card` cycle until every hand is empty. Player input arrives
//! through the public entry points; pacing (animation holds, opponent
//! thinking time) goes through the simulated clock in [`crate::schedule`],
//! which the host steps with [`GameEngine::advance`] or
//! [`GameEngine::run_until_idle`].
//!
//! Invalid input (wrong seat, wrong phase, stale card, animation running)
//! is dropped without a signal.

use tracing::{debug, info, warn};

use crate::cards::{CardId, DeckGenerator, Direction};
use crate::core::{
    ConfigError, GameConfig, GamePhase, GameRng, GameState, HorseId, Placement, PlacementSide,
    PlayerId, Ranking, TurnPhase,
};
use crate::effects::CardResolver;
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::schedule::Scheduler;

use super::policy::{OpponentPolicy, RandomOpponent};
use super::scene::{CameraSettle, NullScene, Scene};
use super::score::{PlayerScore, ScoreCalculator};

/// Deferred engine steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    /// Open the first turn after the start message.
    BeginTurn,
    AiTurn,
    /// Opponent plays its card after taking a token.
    AiPlayCard(PlayerId),
    /// Animation hold is over.
    FinishCardPlay,
    AiExchange(PlayerId),
    AiPlacement,
    ShowResults,
}

/// Input the human seat is expected to give next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prompt {
    /// Pick and confirm two betting horses.
    Betting,
    /// Select a horse and place it.
    Placement,
    /// Take the dark-horse token or skip.
    Token,
    /// Play a card.
    Card,
    /// Pick a betting exchange.
    Exchange,
}

/// Match orchestrator.
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    rng: GameRng,
    scheduler: Scheduler<Task>,
    scene: Box<dyn Scene>,
    policy: Box<dyn OpponentPolicy>,
    pending_exchange: Option<PlayerId>,
    results: Option<Vec<PlayerScore>>,
}

impl GameEngine {
    /// Create an engine in the betting phase with a random opening seat.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = GameRng::from_seed(config.seed);
        let first_turn = PlayerId::new(rng.gen_range_usize(0..config.player_count) as u8);
        let state = GameState::new(&config, first_turn);
        let policy = RandomOpponent::new(config.ai_token_probability);

        debug!(seed = rng.seed(), first_turn = %first_turn, "engine created");

        Ok(Self {
            config,
            state,
            rng,
            scheduler: Scheduler::new(),
            scene: Box::new(NullScene),
            policy: Box::new(policy),
            pending_exchange: None,
            results: None,
        })
    }

    /// Use a renderer.
    #[must_use]
    pub fn with_scene(mut self, scene: impl Scene + 'static) -> Self {
        self.scene = Box::new(scene);
        self
    }

    /// Replace the opponent policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl OpponentPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Final standings, once the camera has settled.
    #[must_use]
    pub fn results(&self) -> Option<&[PlayerScore]> {
        self.results.as_deref()
    }

    /// Seat that still has to resolve an exchange card.
    #[must_use]
    pub fn pending_exchange(&self) -> Option<PlayerId> {
        self.pending_exchange
    }

    /// Current simulated time in milliseconds.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// No deferred step is waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// What the human should do next, if anything.
    #[must_use]
    pub fn prompt(&self) -> Option<Prompt> {
        if self.state.is_game_over() {
            return None;
        }
        match self.state.game_phase() {
            GamePhase::Betting => Some(Prompt::Betting),
            GamePhase::Placement => self
                .state
                .placement_turn()
                .is_human()
                .then_some(Prompt::Placement),
            GamePhase::Playing => {
                if self.pending_exchange == Some(PlayerId::HUMAN) {
                    return Some(Prompt::Exchange);
                }
                if !self.state.is_human_turn() || self.state.is_animating() || !self.scheduler.is_idle() {
                    return None;
                }
                Some(match self.state.turn_phase() {
                    TurnPhase::Token => Prompt::Token,
                    TurnPhase::Card => Prompt::Card,
                })
            }
        }
    }

    // === Observers ===

    pub fn subscribe(&mut self, handler: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.state.subscribe(handler)
    }

    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.state.subscribe_to(kind, handler)
    }

    pub fn events(&mut self) -> &mut EventBus {
        self.state.events()
    }

    // === Clock ===

    /// Step simulated time forward, running every task that falls due.
    pub fn advance(&mut self, ms: u64) {
        let target = self.scheduler.now().saturating_add(ms);
        while let Some(task) = self.scheduler.pop_due(target) {
            self.run_task(task);
        }
        self.scheduler.advance_to(target);
    }

    /// Run tasks until nothing is scheduled. Returns how many ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_next() {
            self.run_task(task);
            ran += 1;
        }
        ran
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::BeginTurn => self.begin_turn(),
            Task::AiTurn => self.ai_turn(),
            Task::AiPlayCard(player) => self.ai_play_card(player),
            Task::FinishCardPlay => {
                self.state.set_animating(false);
                self.end_turn();
            }
            Task::AiExchange(player) => self.ai_exchange(player),
            Task::AiPlacement => self.ai_placement(),
            Task::ShowResults => self.show_results(),
        }
    }

    // === Betting ===

    pub fn toggle_betting_horse(&mut self, horse: HorseId) {
        if self.state.game_phase() != GamePhase::Betting || !self.is_horse(horse) {
            return;
        }
        self.state.toggle_betting_horse(horse);
        self.emit_selection();
    }

    pub fn clear_betting(&mut self) {
        if self.state.game_phase() != GamePhase::Betting {
            return;
        }
        self.state.clear_betting_selection();
        self.emit_selection();
    }

    /// Lock in the two selected horses and move on to placement.
    pub fn confirm_betting(&mut self) {
        if self.state.game_phase() != GamePhase::Betting {
            return;
        }
        let Some(horses) = self.state.confirm_betting() else {
            return;
        };
        debug!(?horses, "betting confirmed");
        self.state.emit(GameEvent::BettingConfirmed { horses });
        self.state.advance_game_phase(GamePhase::Placement);
        self.announce_placement_turn();
    }

    fn emit_selection(&mut self) {
        let selection = self.state.betting_selection().iter().copied().collect();
        self.state.emit(GameEvent::BettingSelectionChanged { selection });
    }

    fn is_horse(&self, horse: HorseId) -> bool {
        (1..=self.config.horse_count).contains(&(horse.raw() as usize))
    }

    // === Placement ===

    pub fn select_placement_horse(&mut self, horse: HorseId) {
        if !self.human_places() {
            return;
        }
        self.state.select_placement_horse(horse);
    }

    /// Place the selected horse at one end of the row.
    pub fn place_horse_at(&mut self, side: PlacementSide) {
        if !self.human_places() {
            return;
        }
        self.place(PlayerId::HUMAN, side);
    }

    /// Place every remaining horse at random; the last one becomes the
    /// dark horse.
    pub fn skip_placement(&mut self) {
        if !self.human_places() {
            return;
        }
        let mut remaining = self.state.available_horses().to_vec();
        self.rng.shuffle(&mut remaining);

        let count = remaining.len().saturating_sub(1);
        for horse in remaining.into_iter().take(count) {
            let side = self.random_side();
            self.state.select_placement_horse(horse);
            let outcome = self.state.place_horse_at(side);
            self.after_placement(PlayerId::HUMAN, side, outcome, false);
        }
    }

    fn human_places(&self) -> bool {
        self.state.game_phase() == GamePhase::Placement && self.state.placement_turn().is_human()
    }

    fn random_side(&mut self) -> PlacementSide {
        if self.rng.gen_bool(0.5) {
            PlacementSide::Left
        } else {
            PlacementSide::Right
        }
    }

    fn place(&mut self, player: PlayerId, side: PlacementSide) {
        let outcome = self.state.place_horse_at(side);
        self.after_placement(player, side, outcome, true);
    }

    fn after_placement(&mut self, player: PlayerId, side: PlacementSide, outcome: Placement, rotate: bool) {
        match outcome {
            Placement::Rejected => {}
            Placement::Placed(horse) => {
                debug!(player = %player, horse = %horse, ?side, "horse placed");
                self.state.emit(GameEvent::HorsePlaced { player, horse, side });
                if rotate {
                    self.state.advance_placement_turn();
                    self.announce_placement_turn();
                }
            }
            Placement::Completed { placed, dark_horse } => {
                self.state.emit(GameEvent::HorsePlaced {
                    player,
                    horse: placed,
                    side,
                });
                let ranking = self.state.horse_order().clone();
                debug!(dark_horse = %dark_horse, %ranking, "placement complete");
                self.scene.update_horse_positions(&ranking);
                self.state.emit(GameEvent::PlacementCompleted { dark_horse, ranking });
                self.start_match();
            }
        }
    }

    fn announce_placement_turn(&mut self) {
        let player = self.state.placement_turn();
        self.state.emit(GameEvent::PlacementTurn { player });
        if !player.is_human() {
            self.scheduler
                .schedule(self.config.timing.ai_placement_delay, Task::AiPlacement);
        }
    }

    fn ai_placement(&mut self) {
        let player = self.state.placement_turn();
        if self.state.game_phase() != GamePhase::Placement || player.is_human() {
            return;
        }
        let Some((horse, side)) = self
            .policy
            .choose_placement(self.state.available_horses(), &mut self.rng)
        else {
            return;
        };
        self.state.select_placement_horse(horse);
        self.place(player, side);
    }

    // === Match start ===

    /// Skip betting and placement: random ranking, the last-place horse
    /// is the dark horse, every seat gets a random betting.
    pub fn quick_start(&mut self) {
        if self.state.game_phase() != GamePhase::Betting {
            return;
        }
        self.start_match();
    }

    fn start_match(&mut self) {
        if !self.state.advance_game_phase(GamePhase::Playing) {
            return;
        }

        let generator = DeckGenerator::new(&self.config);
        let deck = generator.generate(&mut self.rng);
        self.state.set_hands(generator.deal(deck));

        let dark_horse = match self.state.dark_horse() {
            Some(horse) => horse,
            None => {
                let ranking = generator.shuffled_ranking(&mut self.rng);
                let horse = ranking.last();
                self.state.set_dark_horse(horse);
                self.scene.update_horse_positions(&ranking);
                self.state.set_horse_order(ranking);
                horse
            }
        };

        let pick: Vec<HorseId> = self.state.betting(PlayerId::HUMAN).to_vec();
        let bettings = generator.bettings(Some(pick.as_slice()), &mut self.rng);
        self.state.set_bettings(bettings);

        let ranking = self.state.horse_order().clone();
        info!(dark_horse = %dark_horse, %ranking, first_turn = %self.state.turn(), "race starting");
        self.state.emit(GameEvent::GameInitialized { dark_horse, ranking });
        self.state.emit(GameEvent::StartMessage {
            message: "And they're off!".to_string(),
        });

        self.scheduler
            .schedule(self.config.timing.start_delay, Task::BeginTurn);
    }

    fn begin_turn(&mut self) {
        if self.state.is_game_over() {
            return;
        }
        if self.state.is_human_turn() {
            self.start_player_turn();
        } else {
            self.ai_turn();
        }
    }

    fn set_ranking(&mut self, ranking: Ranking) {
        self.scene.update_horse_positions(&ranking);
        self.state.set_horse_order(ranking);
    }

    // === Play ===

    fn accepts_play_input(&self) -> bool {
        self.state.game_phase() == GamePhase::Playing
            && !self.state.is_game_over()
            && !self.state.is_animating()
            && self.pending_exchange.is_none()
    }

    /// Play a card. `direction` steers a plus/minus card.
    pub fn play_card(&mut self, player: PlayerId, card_id: CardId, direction: Option<Direction>) {
        if !self.accepts_play_input() || self.state.turn() != player {
            return;
        }
        if player.is_human() && self.state.turn_phase() != TurnPhase::Card {
            return;
        }
        let Some(card) = self.state.remove_card(player, card_id) else {
            return;
        };

        self.state.set_animating(true);

        let resolution = CardResolver::resolve(
            &card,
            self.state.horse_order(),
            &player.label(),
            direction,
            &mut self.rng,
        );
        debug!(player = %player, %card, ranking = %resolution.ranking, "card resolved");

        self.set_ranking(resolution.ranking);
        self.state
            .record_play(player, card.clone(), resolution.message.clone());
        self.state.emit(GameEvent::CardPlayed {
            player,
            card,
            message: resolution.message,
            is_human: player.is_human(),
        });

        if resolution.exchange {
            self.pending_exchange = Some(player);
            self.state.emit(GameEvent::ExchangeRequested { player });
            if !player.is_human() {
                self.scheduler
                    .schedule(self.config.timing.ai_exchange_delay, Task::AiExchange(player));
            }
        } else {
            self.scheduler
                .schedule(self.config.timing.card_hold, Task::FinishCardPlay);
        }
    }

    /// Swap one of the human's betting horses with another seat's.
    pub fn select_exchange(&mut self, target: PlayerId, own_slot: usize, their_slot: usize) {
        if self.pending_exchange != Some(PlayerId::HUMAN) {
            return;
        }
        if self.exchange(PlayerId::HUMAN, target, own_slot, their_slot) {
            self.close_exchange();
        }
    }

    fn ai_exchange(&mut self, player: PlayerId) {
        if self.pending_exchange != Some(player) {
            return;
        }
        let choice = self
            .policy
            .choose_exchange(&self.state, player, &mut self.rng);
        let swapped = choice
            .is_some_and(|(target, own, theirs)| self.exchange(player, target, own, theirs));
        if !swapped {
            self.state.emit(GameEvent::Notice {
                message: format!("{}: no betting to exchange.", player.label()),
                is_human: false,
            });
        }
        self.close_exchange();
    }

    fn exchange(&mut self, player: PlayerId, target: PlayerId, own_slot: usize, their_slot: usize) -> bool {
        let Some((given, received)) = self
            .state
            .exchange_betting(player, own_slot, target, their_slot)
        else {
            return false;
        };
        debug!(player = %player, target = %target, given = %given, received = %received, "betting exchanged");
        self.state.emit(GameEvent::BettingExchanged {
            player,
            target,
            given,
            received,
        });
        true
    }

    fn close_exchange(&mut self) {
        self.pending_exchange = None;
        self.scheduler
            .schedule(self.config.timing.card_hold, Task::FinishCardPlay);
    }

    /// Take the dark-horse token during the token phase.
    ///
    /// With one card or fewer in hand the request is refused with a notice.
    pub fn take_dark_horse_token(&mut self, player: PlayerId) {
        if !self.accepts_play_input() {
            return;
        }
        if self.state.turn() != player
            || self.state.turn_phase() != TurnPhase::Token
            || !self.state.can_take_token(player)
        {
            if self.state.hand(player).len() <= 1 {
                self.state.emit(GameEvent::Notice {
                    message: format!("{} can't take a token with one card or fewer!", player.label()),
                    is_human: player.is_human(),
                });
            }
            return;
        }

        self.state.take_token(player);
        self.state.set_turn_phase(TurnPhase::Card);
        debug!(player = %player, left = self.state.tokens_available(), "token taken");
        self.state.emit(GameEvent::TokenTaken {
            player,
            is_human: player.is_human(),
        });
    }

    /// Pass on the token and move to the card phase.
    pub fn skip_token(&mut self, player: PlayerId) {
        if !self.accepts_play_input()
            || self.state.turn() != player
            || self.state.turn_phase() != TurnPhase::Token
        {
            return;
        }
        self.state.set_turn_phase(TurnPhase::Card);
        self.state.emit(GameEvent::TokenSkipped {
            player,
            is_human: player.is_human(),
        });
    }

    // === Turn flow ===

    /// Hand the turn to the next seat, or finish the race once every hand
    /// is empty.
    ///
    /// Empty-handed seats are skipped while the token pool is empty; the
    /// human is always skipped with an empty hand.
    fn end_turn(&mut self) {
        if self.state.is_game_over() || !self.accepts_play_input() {
            return;
        }
        if self.state.total_cards_remaining() == 0 {
            self.finish_game();
            return;
        }

        let seats = self.state.player_count();
        let mut next = self.state.turn().next(seats);
        let mut skipped = 0;
        while self.state.hand(next).is_empty()
            && (self.state.tokens_available() == 0 || next.is_human())
        {
            next = next.next(seats);
            skipped += 1;
            if skipped > seats {
                warn!(skipped, "no seat can act, finishing race");
                self.finish_game();
                return;
            }
        }

        self.state.set_turn(next);
        self.state.set_turn_phase(TurnPhase::Token);
        debug!(turn = %next, remaining = self.state.total_cards_remaining(), "turn changed");
        self.state.emit(GameEvent::TurnChanged {
            turn: next,
            phase: TurnPhase::Token,
        });

        if next.is_human() {
            self.start_player_turn();
        } else {
            self.scheduler
                .schedule(self.config.timing.ai_turn_delay, Task::AiTurn);
        }
    }

    /// Open the human's turn at the token phase if a token can be taken,
    /// otherwise straight at the card phase.
    fn start_player_turn(&mut self) {
        if self.state.is_game_over() || !self.state.is_human_turn() {
            return;
        }
        let phase = if self.state.can_take_token(PlayerId::HUMAN) {
            TurnPhase::Token
        } else {
            TurnPhase::Card
        };
        self.state.set_turn_phase(phase);
        self.state.emit(GameEvent::PlayerTurnStarted { phase });
    }

    /// Let the opponent holding the turn act.
    fn ai_turn(&mut self) {
        if !self.accepts_play_input() || self.state.is_human_turn() {
            return;
        }
        let ai = self.state.turn();

        if self.state.can_take_token(ai) && self.policy.wants_token(&self.state, ai, &mut self.rng) {
            self.state.take_token(ai);
            self.state.set_turn_phase(TurnPhase::Card);
            debug!(player = %ai, "opponent took a token");
            self.state.emit(GameEvent::TokenTaken {
                player: ai,
                is_human: false,
            });
            self.scheduler
                .schedule(self.config.timing.ai_token_play_delay, Task::AiPlayCard(ai));
        } else if !self.state.hand(ai).is_empty() {
            self.ai_play_card(ai);
        } else {
            self.end_turn();
        }
    }

    fn ai_play_card(&mut self, ai: PlayerId) {
        if self.state.turn() != ai {
            return;
        }
        let Some(card_id) = self.policy.choose_card(self.state.hand(ai), &mut self.rng) else {
            return;
        };
        let direction = self
            .state
            .hand(ai)
            .iter()
            .find(|card| card.id == card_id)
            .and_then(|card| self.policy.choose_direction(card, &mut self.rng));
        self.play_card(ai, card_id, direction);
    }

    // === Finish ===

    /// End the race. Only the first call has any effect.
    fn finish_game(&mut self) {
        if !self.state.set_game_over() {
            return;
        }
        let winner = self.state.horse_order().leader();
        info!(winner = %winner, ranking = %self.state.horse_order(), "race finished");
        self.state.emit(GameEvent::RaceFinishing { winner });

        match self.scene.animate_camera(winner) {
            CameraSettle::After(ms) => self.scheduler.schedule(ms, Task::ShowResults),
            CameraSettle::Deferred => {}
        }
    }

    /// Report that the finish camera has settled.
    pub fn camera_settled(&mut self) {
        self.show_results();
    }

    fn show_results(&mut self) {
        if !self.state.is_game_over() || self.results.is_some() {
            return;
        }
        let results = ScoreCalculator::new(&self.config).calculate(
            self.state.horse_order(),
            self.state.bettings(),
            self.state.token_counts(),
            self.state.dark_horse(),
        );
        for score in &results {
            info!(player = %score.name, score = score.score, tokens = score.token_bonus, "standing");
        }
        self.state.emit(GameEvent::RaceFinished {
            results: results.clone(),
        });
        self.results = Some(results);
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("state", &self.state)
            .field("scheduler", &self.scheduler)
            .field("pending_exchange", &self.pending_exchange)
            .field("finished", &self.results.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::ActionCard;
    use crate::core::PlayerMap;
    use smallvec::smallvec;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(seed: u64) -> GameEngine {
        GameEngine::new(GameConfig::default().with_seed(seed)).unwrap()
    }

    fn record(engine: &mut GameEngine, kind: EventKind) -> Rc<RefCell<Vec<GameEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.subscribe_to(kind, move |e| sink.borrow_mut().push(e.clone()));
        seen
    }

    fn with_token_probability(probability: f64) -> GameEngine {
        let config = GameConfig::default()
            .with_seed(7)
            .with_ai_token_probability(probability);
        GameEngine::new(config).unwrap()
    }

    /// Quick-started engine with the human to act and custom hands.
    fn playing(hands: [Vec<ActionCard>; 4]) -> GameEngine {
        deal_into(engine(7), hands)
    }

    fn deal_into(mut engine: GameEngine, hands: [Vec<ActionCard>; 4]) -> GameEngine {
        engine.quick_start();
        engine.scheduler = Scheduler::new();
        engine
            .state
            .set_hands(PlayerMap::new(4, |p| hands[p.index()].clone()));
        engine.state.set_turn(PlayerId::HUMAN);
        engine.start_player_turn();
        engine
    }

    fn cards(ids: std::ops::Range<u32>) -> Vec<ActionCard> {
        ids.map(ActionCard::rider_fall_off).collect()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = GameConfig {
            player_count: 0,
            ..GameConfig::default()
        };
        assert!(matches!(GameEngine::new(config), Err(ConfigError::PlayerCount(0))));
    }

    #[test]
    fn test_betting_then_placement() {
        let mut engine = engine(1);
        assert_eq!(engine.prompt(), Some(Prompt::Betting));

        engine.confirm_betting();
        assert_eq!(engine.state().game_phase(), GamePhase::Betting);

        engine.toggle_betting_horse(HorseId::new(1));
        engine.toggle_betting_horse(HorseId::new(2));
        engine.toggle_betting_horse(HorseId::new(9));
        engine.toggle_betting_horse(HorseId::new(4));
        assert_eq!(
            engine.state().betting_selection(),
            &[HorseId::new(2), HorseId::new(4)]
        );

        engine.confirm_betting();
        assert_eq!(engine.state().game_phase(), GamePhase::Placement);
        assert_eq!(engine.prompt(), Some(Prompt::Placement));

        // Betting input is closed now.
        engine.toggle_betting_horse(HorseId::new(5));
        assert_eq!(engine.state().betting_selection().len(), 2);
    }

    #[test]
    fn test_placement_rotates_through_opponents() {
        let mut engine = engine(2);
        let placed = record(&mut engine, EventKind::HorsePlaced);
        engine.toggle_betting_horse(HorseId::new(1));
        engine.toggle_betting_horse(HorseId::new(2));
        engine.confirm_betting();

        engine.select_placement_horse(HorseId::new(4));
        engine.place_horse_at(PlacementSide::Right);
        assert_eq!(engine.state().placement_turn(), PlayerId::new(1));
        assert_eq!(engine.prompt(), None);

        // Human input is ignored on an opponent's placement turn.
        engine.select_placement_horse(HorseId::new(5));
        assert_eq!(engine.state().placement_selection(), None);

        engine.advance(engine.config().timing.ai_placement_delay);
        assert_eq!(engine.state().placement_turn(), PlayerId::new(2));
        assert_eq!(placed.borrow().len(), 2);
    }

    #[test]
    fn test_skip_placement_fixes_dark_horse() {
        let mut engine = engine(3);
        let completed = record(&mut engine, EventKind::PlacementCompleted);
        engine.toggle_betting_horse(HorseId::new(6));
        engine.toggle_betting_horse(HorseId::new(6));
        engine.toggle_betting_horse(HorseId::new(3));
        engine.toggle_betting_horse(HorseId::new(5));
        engine.confirm_betting();
        engine.skip_placement();

        assert_eq!(engine.state().game_phase(), GamePhase::Playing);
        let events = completed.borrow();
        let GameEvent::PlacementCompleted { dark_horse, ranking } = &events[0] else {
            panic!("expected placement completion");
        };
        assert_eq!(ranking.last(), *dark_horse);
        assert_eq!(engine.state().dark_horse(), Some(*dark_horse));
        assert_eq!(
            engine.state().betting(PlayerId::HUMAN),
            &[HorseId::new(3), HorseId::new(5)]
        );
        for player in PlayerId::all(4) {
            assert_eq!(engine.state().hand(player).len(), 6);
        }
    }

    #[test]
    fn test_quick_start_deals_and_schedules() {
        let mut engine = engine(4);
        engine.quick_start();

        let state = engine.state();
        assert_eq!(state.game_phase(), GamePhase::Playing);
        assert_eq!(state.total_cards_remaining(), 24);
        assert_eq!(state.dark_horse(), Some(state.horse_order().last()));
        for player in PlayerId::all(4) {
            assert_eq!(state.betting(player).len(), 2);
        }
        assert!(!engine.is_idle());
        assert_eq!(engine.prompt(), None);

        // Second call is ignored.
        engine.quick_start();
        assert_eq!(engine.state().total_cards_remaining(), 24);
    }

    #[test]
    fn test_human_token_then_card() {
        let mut engine = playing([cards(0..3), cards(3..6), cards(6..9), cards(9..12)]);
        assert_eq!(engine.prompt(), Some(Prompt::Token));

        // Card phase not reached yet.
        engine.play_card(PlayerId::HUMAN, CardId::new(0), None);
        assert_eq!(engine.state().hand(PlayerId::HUMAN).len(), 3);

        engine.take_dark_horse_token(PlayerId::HUMAN);
        assert_eq!(engine.state().tokens(PlayerId::HUMAN), 1);
        assert_eq!(engine.state().tokens_available(), 1);
        assert_eq!(engine.prompt(), Some(Prompt::Card));

        engine.play_card(PlayerId::HUMAN, CardId::new(0), None);
        assert_eq!(engine.state().hand(PlayerId::HUMAN).len(), 2);
        assert!(engine.state().is_animating());

        // Dropped while animating.
        engine.play_card(PlayerId::HUMAN, CardId::new(1), None);
        assert_eq!(engine.state().hand(PlayerId::HUMAN).len(), 2);

        engine.advance(engine.config().timing.card_hold);
        assert!(!engine.state().is_animating());
        assert_eq!(engine.state().turn(), PlayerId::new(1));
    }

    #[test]
    fn test_skip_token() {
        let mut engine = playing([cards(0..3), cards(3..6), cards(6..9), cards(9..12)]);
        let skipped = record(&mut engine, EventKind::TokenSkipped);

        engine.skip_token(PlayerId::new(1));
        assert!(skipped.borrow().is_empty());

        engine.skip_token(PlayerId::HUMAN);
        assert_eq!(engine.state().turn_phase(), TurnPhase::Card);
        assert_eq!(skipped.borrow().len(), 1);
        assert_eq!(engine.state().tokens_available(), 2);
    }

    #[test]
    fn test_single_card_opens_card_phase_and_refuses_token() {
        let mut engine = playing([cards(0..1), cards(1..2), cards(2..5), cards(5..8)]);
        let notices = record(&mut engine, EventKind::Notice);
        assert_eq!(engine.state().turn_phase(), TurnPhase::Card);

        engine.take_dark_horse_token(PlayerId::HUMAN);
        engine.take_dark_horse_token(PlayerId::new(1));
        assert_eq!(engine.state().tokens(PlayerId::HUMAN), 0);
        assert_eq!(engine.state().tokens(PlayerId::new(1)), 0);
        assert_eq!(
            notices.borrow().as_slice(),
            &[
                GameEvent::Notice {
                    message: "You can't take a token with one card or fewer!".to_string(),
                    is_human: true,
                },
                GameEvent::Notice {
                    message: "AI 1 can't take a token with one card or fewer!".to_string(),
                    is_human: false,
                },
            ]
        );
    }

    #[test]
    fn test_out_of_turn_play_ignored() {
        let mut engine = playing([cards(0..3), cards(3..6), cards(6..9), cards(9..12)]);
        engine.play_card(PlayerId::new(2), CardId::new(6), None);
        assert_eq!(engine.state().hand(PlayerId::new(2)).len(), 3);

        // Stale id.
        engine.skip_token(PlayerId::HUMAN);
        engine.play_card(PlayerId::HUMAN, CardId::new(5), None);
        assert_eq!(engine.state().hand(PlayerId::HUMAN).len(), 3);
        assert!(!engine.state().is_animating());
    }

    /// Human passes the token and plays card 0, then the hold runs out.
    fn human_plays_first_card(engine: &mut GameEngine) {
        engine.skip_token(PlayerId::HUMAN);
        engine.play_card(PlayerId::HUMAN, CardId::new(0), None);
        engine.advance(engine.config().timing.card_hold);
    }

    #[test]
    fn test_card_phase_waits_for_a_card() {
        let mut engine = playing([cards(0..3), cards(3..6), cards(6..9), cards(9..12)]);
        engine.skip_token(PlayerId::HUMAN);

        engine.advance(60_000);
        assert_eq!(engine.state().turn(), PlayerId::HUMAN);
        assert_eq!(engine.prompt(), Some(Prompt::Card));
        assert_eq!(engine.state().hand(PlayerId::HUMAN).len(), 3);
    }

    #[test]
    fn test_end_turn_skips_empty_hands_when_pool_empty() {
        let mut engine = playing([cards(0..2), Vec::new(), Vec::new(), cards(2..4)]);
        engine.state.take_token(PlayerId::HUMAN);
        engine.state.take_token(PlayerId::new(3));
        assert_eq!(engine.state().tokens_available(), 0);

        human_plays_first_card(&mut engine);
        assert_eq!(engine.state().turn(), PlayerId::new(3));
    }

    #[test]
    fn test_end_turn_visits_empty_opponent_while_tokens_remain() {
        let mut engine = playing([cards(0..2), Vec::new(), cards(2..4), cards(4..6)]);

        human_plays_first_card(&mut engine);
        assert_eq!(engine.state().turn(), PlayerId::new(1));

        // The empty-handed opponent passes straight on.
        engine.advance(engine.config().timing.ai_turn_delay);
        assert_eq!(engine.state().turn(), PlayerId::new(2));
    }

    #[test]
    fn test_end_turn_skips_empty_human_while_tokens_remain() {
        let mut engine = deal_into(
            with_token_probability(0.0),
            [Vec::new(), cards(0..2), cards(2..4), cards(4..6)],
        );
        engine.state.set_turn(PlayerId::new(3));
        engine.scheduler.schedule(0, Task::AiTurn);
        engine.advance(0);
        assert_eq!(engine.state().hand(PlayerId::new(3)).len(), 1);

        engine.advance(engine.config().timing.card_hold);
        assert_eq!(engine.state().turn(), PlayerId::new(1));
        assert_eq!(engine.state().tokens_available(), 2);
    }

    #[test]
    fn test_opponent_takes_token_then_plays() {
        let mut engine = deal_into(
            with_token_probability(1.0),
            [cards(0..2), cards(2..5), cards(5..8), cards(8..11)],
        );
        let taken = record(&mut engine, EventKind::TokenTaken);
        let played = record(&mut engine, EventKind::CardPlayed);

        human_plays_first_card(&mut engine);
        assert_eq!(engine.state().turn(), PlayerId::new(1));

        engine.advance(engine.config().timing.ai_turn_delay);
        assert_eq!(
            taken.borrow().as_slice(),
            &[GameEvent::TokenTaken {
                player: PlayerId::new(1),
                is_human: false
            }]
        );
        assert_eq!(engine.state().tokens(PlayerId::new(1)), 1);
        assert_eq!(engine.state().turn_phase(), TurnPhase::Card);
        assert_eq!(engine.state().hand(PlayerId::new(1)).len(), 3);
        assert_eq!(played.borrow().len(), 1);

        engine.advance(engine.config().timing.ai_token_play_delay);
        assert_eq!(engine.state().hand(PlayerId::new(1)).len(), 2);
        let played = played.borrow();
        assert_eq!(played.len(), 2);
        assert!(matches!(
            &played[1],
            GameEvent::CardPlayed { player, is_human: false, .. } if *player == PlayerId::new(1)
        ));
    }

    #[test]
    fn test_opponent_exchange_then_turn_moves_on() {
        let mut engine = deal_into(
            with_token_probability(0.0),
            [cards(0..2), vec![ActionCard::exchange_betting(2)], cards(3..5), cards(5..7)],
        );
        let bettings: [[u8; 2]; 4] = [[1, 5], [2, 7], [3, 6], [4, 4]];
        for (seat, [a, b]) in bettings.into_iter().enumerate() {
            engine.state.set_betting(
                PlayerId::new(seat as u8),
                smallvec![HorseId::new(a), HorseId::new(b)],
            );
        }
        let exchanged = record(&mut engine, EventKind::BettingExchanged);

        human_plays_first_card(&mut engine);
        engine.advance(engine.config().timing.ai_turn_delay);
        assert_eq!(engine.pending_exchange(), Some(PlayerId::new(1)));
        assert_eq!(engine.prompt(), None);

        engine.advance(engine.config().timing.ai_exchange_delay);
        assert_eq!(engine.pending_exchange(), None);
        let events = exchanged.borrow();
        let GameEvent::BettingExchanged { player, target, given, received } = &events[0] else {
            panic!("expected an exchange");
        };
        let (player, target, given, received) = (*player, *target, *given, *received);
        assert_eq!(player, PlayerId::new(1));
        assert_ne!(target, player);
        assert!([HorseId::new(2), HorseId::new(7)].contains(&given));
        assert!(engine.state().betting(player).contains(&received));
        assert!(engine.state().betting(target).contains(&given));

        engine.advance(engine.config().timing.card_hold);
        assert_eq!(engine.state().turn(), PlayerId::new(2));
    }

    #[test]
    fn test_last_card_finishes_race() {
        let mut engine = playing([cards(0..1), Vec::new(), Vec::new(), Vec::new()]);
        let finishing = record(&mut engine, EventKind::RaceFinishing);

        engine.play_card(PlayerId::HUMAN, CardId::new(0), None);
        engine.advance(engine.config().timing.card_hold);

        assert!(engine.state().is_game_over());
        assert_eq!(finishing.borrow().len(), 1);
        assert_eq!(engine.results().map(<[PlayerScore]>::len), Some(4));

        // Input after the finish changes nothing.
        engine.skip_token(PlayerId::HUMAN);
        engine.camera_settled();
        engine.run_until_idle();
        assert_eq!(finishing.borrow().len(), 1);
        assert_eq!(engine.prompt(), None);
    }

    #[test]
    fn test_human_exchange_flow() {
        let mut engine = playing([
            vec![ActionCard::exchange_betting(0), ActionCard::rider_fall_off(1)],
            cards(2..4),
            cards(4..6),
            cards(6..8),
        ]);
        engine.state.set_betting(PlayerId::HUMAN, smallvec![HorseId::new(1), HorseId::new(2)]);
        engine.state.set_betting(PlayerId::new(2), smallvec![HorseId::new(6), HorseId::new(7)]);
        let ranking = engine.state().horse_order().clone();

        engine.skip_token(PlayerId::HUMAN);
        engine.play_card(PlayerId::HUMAN, CardId::new(0), None);
        assert_eq!(engine.state().horse_order(), &ranking);
        assert_eq!(engine.prompt(), Some(Prompt::Exchange));

        engine.select_exchange(PlayerId::HUMAN, 0, 0);
        assert_eq!(engine.pending_exchange(), Some(PlayerId::HUMAN));

        engine.select_exchange(PlayerId::new(2), 1, 0);
        assert_eq!(engine.pending_exchange(), None);
        assert_eq!(
            engine.state().betting(PlayerId::HUMAN),
            &[HorseId::new(1), HorseId::new(6)]
        );
        assert_eq!(
            engine.state().betting(PlayerId::new(2)),
            &[HorseId::new(2), HorseId::new(7)]
        );

        engine.advance(engine.config().timing.card_hold);
        assert_eq!(engine.state().turn(), PlayerId::new(1));
    }

    struct ManualCamera {
        positions: Rc<RefCell<usize>>,
    }

    impl Scene for ManualCamera {
        fn update_horse_positions(&mut self, _ranking: &Ranking) {
            *self.positions.borrow_mut() += 1;
        }

        fn animate_camera(&mut self, _winner: HorseId) -> CameraSettle {
            CameraSettle::Deferred
        }
    }

    #[test]
    fn test_deferred_camera_scores_once() {
        let positions = Rc::new(RefCell::new(0));
        let engine = engine(5).with_scene(ManualCamera {
            positions: Rc::clone(&positions),
        });
        let mut engine = deal_into(engine, [cards(0..1), Vec::new(), Vec::new(), Vec::new()]);
        let finished = record(&mut engine, EventKind::RaceFinished);
        assert_eq!(*positions.borrow(), 1);

        engine.play_card(PlayerId::HUMAN, CardId::new(0), None);
        assert_eq!(*positions.borrow(), 2);
        engine.run_until_idle();
        assert!(engine.state().is_game_over());
        assert!(engine.results().is_none());

        engine.camera_settled();
        engine.camera_settled();
        assert_eq!(finished.borrow().len(), 1);
        assert_eq!(engine.results().map(<[PlayerScore]>::len), Some(4));
    }
}
