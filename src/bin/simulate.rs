//! Headless match runner.
//!
//! Plays one full match with the human seat driven by the random policy
//! and prints the final standings.

use clap::Parser;
use dark_horse::{
    EventKind, GameConfig, GameEngine, GameEvent, GameRng, HorseId, OpponentPolicy, PlayerId,
    Prompt, RandomOpponent,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Upper bound on host-loop iterations before giving up.
const MAX_STEPS: usize = 10_000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play a headless dark-horse match")]
struct Args {
    /// RNG seed; omit for a random match.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Skip betting and placement.
    #[arg(short, long)]
    quick: bool,

    /// Log every turn.
    #[arg(short, long)]
    verbose: bool,

    /// Chance a seat grabs the dark-horse token when it may.
    #[arg(long, default_value = "0.2")]
    token_probability: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = GameConfig::default().with_ai_token_probability(args.token_probability);
    config.seed = args.seed;

    let mut engine = GameEngine::new(config)?;
    let mut rng = GameRng::from_seed(args.seed.map(|seed| seed.wrapping_add(1)));
    let human = RandomOpponent::new(args.token_probability);

    engine.subscribe_to(EventKind::CardPlayed, |event| {
        if let GameEvent::CardPlayed { message, .. } = event {
            println!("{message}");
        }
    });

    if args.quick {
        engine.quick_start();
    }

    let mut steps = 0;
    while engine.results().is_none() {
        steps += 1;
        if steps > MAX_STEPS {
            return Err("match did not finish".into());
        }

        engine.run_until_idle();
        match engine.prompt() {
            Some(prompt) => act(&mut engine, &human, prompt, &mut rng),
            None if engine.is_idle() && engine.results().is_none() => {
                warn!(now = engine.now(), "engine stalled");
                return Err("engine stalled waiting for input".into());
            }
            None => {}
        }
    }

    let state = engine.state();
    println!();
    println!("Final order: {}", state.horse_order());
    if let Some(dark_horse) = state.dark_horse() {
        println!("Dark horse:  {dark_horse}");
    }
    println!();
    for (place, score) in engine.results().unwrap_or_default().iter().enumerate() {
        println!(
            "{}. {:<14} {:>4}  tokens {:+}  {}",
            place + 1,
            score.name,
            score.score,
            score.token_bonus,
            score.betting_info()
        );
    }
    info!(simulated_ms = engine.now(), "done");

    Ok(())
}

/// Answer one prompt on behalf of the human seat.
fn act(engine: &mut GameEngine, policy: &RandomOpponent, prompt: Prompt, rng: &mut GameRng) {
    let me = PlayerId::HUMAN;
    match prompt {
        Prompt::Betting => {
            let horses: Vec<HorseId> = HorseId::all(engine.config().horse_count).collect();
            for horse in rng.sample(&horses, 2) {
                engine.toggle_betting_horse(horse);
            }
            engine.confirm_betting();
        }
        Prompt::Placement => {
            if let Some((horse, side)) = policy.choose_placement(engine.state().available_horses(), rng) {
                engine.select_placement_horse(horse);
                engine.place_horse_at(side);
            }
        }
        Prompt::Token => {
            if engine.state().can_take_token(me) && policy.wants_token(engine.state(), me, rng) {
                engine.take_dark_horse_token(me);
            } else {
                engine.skip_token(me);
            }
        }
        Prompt::Card => {
            let hand = engine.state().hand(me);
            let Some(card_id) = policy.choose_card(hand, rng) else {
                return;
            };
            let direction = hand
                .iter()
                .find(|card| card.id == card_id)
                .and_then(|card| policy.choose_direction(card, rng));
            engine.play_card(me, card_id, direction);
        }
        Prompt::Exchange => {
            if let Some((target, own, theirs)) = policy.choose_exchange(engine.state(), me, rng) {
                engine.select_exchange(target, own, theirs);
            }
        }
    }
}
