//! End-to-end matches driven through the public engine API.
//!
//! The human seat is played by the random policy; time is stepped with the
//! simulated clock, so every match below runs instantly and, under a fixed
//! seed, reproducibly.

use std::cell::RefCell;
use std::rc::Rc;

use dark_horse::{
    CardId, EventKind, GameConfig, GameEngine, GameEvent, GamePhase, GameRng, HorseId, OpponentPolicy,
    PlacementSide, PlayerId, PlayerScore, Prompt, RandomOpponent, Ranking, StateField,
};

/// Answer prompts for the human until the results are in.
fn play_out(engine: &mut GameEngine, seed: u64) {
    let policy = RandomOpponent::new(0.3);
    let mut rng = GameRng::new(seed);
    let me = PlayerId::HUMAN;

    for _ in 0..10_000 {
        engine.run_until_idle();
        if engine.results().is_some() {
            return;
        }
        let Some(prompt) = engine.prompt() else {
            panic!("engine idle without a prompt at {}ms", engine.now());
        };
        match prompt {
            Prompt::Betting => {
                engine.toggle_betting_horse(HorseId::new(2));
                engine.toggle_betting_horse(HorseId::new(5));
                engine.confirm_betting();
            }
            Prompt::Placement => {
                let (horse, side) = policy
                    .choose_placement(engine.state().available_horses(), &mut rng)
                    .expect("a horse is left to place");
                engine.select_placement_horse(horse);
                engine.place_horse_at(side);
            }
            Prompt::Token => {
                if policy.wants_token(engine.state(), me, &mut rng) {
                    engine.take_dark_horse_token(me);
                } else {
                    engine.skip_token(me);
                }
            }
            Prompt::Card => {
                let card = policy
                    .choose_card(engine.state().hand(me), &mut rng)
                    .expect("the human only gets a turn with cards in hand");
                engine.play_card(me, card, None);
            }
            Prompt::Exchange => {
                let (target, own, theirs) = policy
                    .choose_exchange(engine.state(), me, &mut rng)
                    .expect("other seats hold bettings");
                engine.select_exchange(target, own, theirs);
            }
        }
    }
    panic!("match did not finish");
}

fn counter(engine: &mut GameEngine, kind: EventKind) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    engine.subscribe_to(kind, move |_| *sink.borrow_mut() += 1);
    count
}

fn assert_permutation(ranking: &Ranking, horses: usize) {
    let mut ids: Vec<u8> = ranking.iter().map(HorseId::raw).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=horses as u8).collect::<Vec<_>>());
}

fn assert_sorted(results: &[PlayerScore]) {
    assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[test]
fn test_quick_match_plays_every_card() {
    let mut engine = GameEngine::new(GameConfig::default().with_seed(42)).unwrap();
    let finishing = counter(&mut engine, EventKind::RaceFinishing);
    let finished = counter(&mut engine, EventKind::RaceFinished);
    let played = counter(&mut engine, EventKind::CardPlayed);

    engine.quick_start();
    play_out(&mut engine, 1);

    let state = engine.state();
    assert!(state.is_game_over());
    assert_eq!(state.total_cards_remaining(), 0);
    assert_eq!(state.history().len(), 24);
    assert_eq!(*played.borrow(), 24);
    assert_eq!(*finishing.borrow(), 1);
    assert_eq!(*finished.borrow(), 1);
    assert_permutation(state.horse_order(), 7);

    let results = engine.results().unwrap();
    assert_eq!(results.len(), 4);
    assert_sorted(results);
    assert_eq!(results.iter().filter(|s| s.is_player).count(), 1);
}

#[test]
fn test_finish_is_idempotent_after_game_over() {
    let mut engine = GameEngine::new(GameConfig::default().with_seed(9)).unwrap();
    let finishing = counter(&mut engine, EventKind::RaceFinishing);
    let finished = counter(&mut engine, EventKind::RaceFinished);
    engine.quick_start();
    play_out(&mut engine, 2);

    let results = engine.results().unwrap().to_vec();
    let turn = engine.state().turn();
    engine.take_dark_horse_token(turn);
    engine.skip_token(turn);
    engine.play_card(turn, CardId::new(0), None);
    engine.camera_settled();
    engine.run_until_idle();

    assert_eq!(*finishing.borrow(), 1);
    assert_eq!(*finished.borrow(), 1);
    assert_eq!(engine.results().unwrap(), results.as_slice());
}

#[test]
fn test_play_input_ignored_before_race() {
    let mut engine = GameEngine::new(GameConfig::default().with_seed(13)).unwrap();
    let finishing = counter(&mut engine, EventKind::RaceFinishing);
    let me = PlayerId::HUMAN;

    engine.take_dark_horse_token(me);
    engine.skip_token(me);
    engine.play_card(me, CardId::new(0), None);
    engine.camera_settled();
    engine.run_until_idle();

    assert_eq!(engine.state().game_phase(), GamePhase::Betting);
    assert_eq!(engine.state().tokens_available(), 2);
    assert_eq!(*finishing.borrow(), 0);
    assert!(engine.results().is_none());
    assert_eq!(engine.prompt(), Some(Prompt::Betting));
}

#[test]
fn test_full_match_through_betting_and_placement() {
    for seed in 0..8 {
        let mut engine = GameEngine::new(GameConfig::default().with_seed(seed)).unwrap();
        let finishing = counter(&mut engine, EventKind::RaceFinishing);

        play_out(&mut engine, seed + 100);

        let state = engine.state();
        assert_eq!(state.game_phase(), GamePhase::Playing);
        assert_eq!(*finishing.borrow(), 1, "seed {seed}");
        assert_permutation(state.horse_order(), 7);
        assert_sorted(engine.results().unwrap());
        assert!(state.tokens_available() <= 2);
        assert!(state.token_counts().values().all(|&t| t <= 1));
    }
}

#[test]
fn test_every_ranking_change_is_a_permutation() {
    let mut engine = GameEngine::new(GameConfig::default().with_seed(77)).unwrap();
    let orders = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&orders);
    engine.subscribe_to(EventKind::FieldChanged, move |event| {
        if let GameEvent::FieldChanged(StateField::HorseOrder { new, .. }) = event {
            sink.borrow_mut().push(new.clone());
        }
    });

    engine.quick_start();
    play_out(&mut engine, 3);

    let orders = orders.borrow();
    assert!(orders.len() > 24);
    for ranking in orders.iter() {
        assert_permutation(ranking, 7);
    }
}

#[test]
fn test_placement_builds_final_order() {
    let mut engine = GameEngine::new(GameConfig::default().with_seed(5)).unwrap();
    let placed = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(None));
    {
        let sink = Rc::clone(&placed);
        engine.subscribe_to(EventKind::HorsePlaced, move |event| {
            if let GameEvent::HorsePlaced { horse, side, .. } = event {
                sink.borrow_mut().push((*horse, *side));
            }
        });
        let sink = Rc::clone(&completed);
        engine.subscribe_to(EventKind::PlacementCompleted, move |event| {
            if let GameEvent::PlacementCompleted { dark_horse, ranking } = event {
                *sink.borrow_mut() = Some((*dark_horse, ranking.clone()));
            }
        });
    }

    engine.toggle_betting_horse(HorseId::new(1));
    engine.toggle_betting_horse(HorseId::new(7));
    engine.confirm_betting();

    // Human always takes the lowest id and puts it on the left.
    while engine.state().game_phase() == GamePhase::Placement {
        if engine.prompt() == Some(Prompt::Placement) {
            let horse = engine.state().available_horses()[0];
            engine.select_placement_horse(horse);
            engine.place_horse_at(PlacementSide::Left);
        } else {
            engine.advance(engine.config().timing.ai_placement_delay);
        }
    }

    let placed = placed.borrow();
    assert_eq!(placed.len(), 6);

    let mut row: Vec<HorseId> = Vec::new();
    for &(horse, side) in placed.iter() {
        match side {
            PlacementSide::Left => row.insert(0, horse),
            PlacementSide::Right => row.push(horse),
        }
    }

    let (dark_horse, ranking) = completed.borrow().clone().expect("placement completed");
    assert!(!row.contains(&dark_horse));
    let mut expected = vec![dark_horse];
    expected.extend(row);
    assert_eq!(ranking.as_slice(), expected.as_slice());
    assert_eq!(engine.state().dark_horse(), Some(dark_horse));
    assert_eq!(
        engine.state().betting(PlayerId::HUMAN),
        &[HorseId::new(1), HorseId::new(7)]
    );
}

#[test]
fn test_same_seed_same_match() {
    let run = |seed| {
        let mut engine = GameEngine::new(GameConfig::default().with_seed(seed)).unwrap();
        engine.quick_start();
        play_out(&mut engine, 11);
        (
            engine.state().horse_order().clone(),
            engine.results().unwrap().to_vec(),
        )
    };

    assert_eq!(run(1234), run(1234));
}

#[test]
fn test_opponents_pace_with_the_clock() {
    let mut engine = GameEngine::new(GameConfig::default().with_seed(21)).unwrap();
    let played = counter(&mut engine, EventKind::CardPlayed);
    engine.quick_start();

    // Nothing happens before the start delay runs out.
    engine.advance(engine.config().timing.start_delay - 1);
    assert_eq!(*played.borrow(), 0);
    assert_eq!(engine.now(), engine.config().timing.start_delay - 1);
}

#[test]
fn test_smaller_table() {
    let config = GameConfig {
        player_count: 2,
        horse_count: 5,
        rank_points: vec![0, 1, 2, 4, 6],
        ..GameConfig::default()
    }
    .with_seed(8);
    let mut engine = GameEngine::new(config).unwrap();
    engine.quick_start();
    play_out(&mut engine, 4);

    assert_permutation(engine.state().horse_order(), 5);
    assert_eq!(engine.results().unwrap().len(), 2);
    assert_eq!(engine.state().history().len(), 12);
}
