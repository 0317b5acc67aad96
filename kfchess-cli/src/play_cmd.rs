//! Play command - run one headless real-time game
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_game(), spawn_producers(), play(), report_results()
//! - Level 3: script and bot producer setup
//! - Level 4: formatting utilities

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use kfchess_core::{
    Catalogue, CatalogueConfig, Clock, Color, Game, GameConfig, GameEvent, GameResult, Keymap,
    MonotonicClock, PlayerController, Producer,
};

use crate::bot::{self, RandomBot};
use crate::script::{self, Script};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Piece catalogue directory (board.csv, transitions.csv, one dir per piece type)
    #[arg(long, value_name = "DIR", default_value = "pieces")]
    pub pieces: PathBuf,

    /// Key script JSON to replay instead of running bots
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Random seed for the bots
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, default_value = "20000")]
    pub max_ticks: u64,

    /// Wall-clock milliseconds between ticks
    #[arg(long, default_value = "16")]
    pub tick_ms: u64,

    /// Game time runs this many times faster than wall time
    #[arg(long, default_value = "1")]
    pub time_factor: u32,

    /// Game milliseconds between bot decisions
    #[arg(long, default_value = "500")]
    pub think_ms: i64,

    /// Cell edge in meters
    #[arg(long, default_value = "1.0")]
    pub cell_m: f64,

    /// Cell edge in pixels
    #[arg(long, default_value = "96")]
    pub cell_px: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// What the game produced
#[derive(Clone, Debug, Serialize)]
struct PlaySummary {
    result: GameResult,
    ticks: u64,
    game_ms: i64,
    applied: usize,
    rejected: usize,
    captures: usize,
    white_score: u32,
    black_score: u32,
    white_log: Vec<String>,
    black_log: Vec<String>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// 1. Load the catalogue and build the game
/// 2. Start one producer per side
/// 3. Tick until decided or out of budget
/// 4. Report results
pub fn run(args: PlayArgs) -> Result<()> {
    let mut game = load_game(&args)?;

    tracing::info!(
        "Starting game: {} pieces on {}x{} ({} tick budget, x{} speed)",
        game.piece_count(),
        game.board().cells_high(),
        game.board().cells_wide(),
        args.max_ticks,
        args.time_factor
    );

    let producers = spawn_producers(&game, &args)?;
    let summary = play(&mut game);

    for producer in producers {
        if !producer.stop() {
            tracing::warn!("A producer thread panicked");
        }
    }

    report_results(&summary, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load the catalogue and wire up clock and loop settings
fn load_game(args: &PlayArgs) -> Result<Game> {
    let config = CatalogueConfig::default().with_cell_size(args.cell_m, args.cell_px);
    let catalogue = Catalogue::load(&args.pieces, config)
        .with_context(|| format!("Failed to load catalogue: {}", args.pieces.display()))?;
    let pieces = catalogue.spawn_pieces().context("Failed to spawn pieces")?;

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::with_time_factor(args.time_factor));
    let game_config = GameConfig::default()
        .with_tick_interval(args.tick_ms)
        .with_max_ticks(args.max_ticks);

    let game = Game::new(pieces, catalogue.board().clone())
        .context("Invalid starting layout")?
        .with_clock(clock)
        .with_config(game_config);
    Ok(game)
}

/// Script replay when a script is given, otherwise two random bots
fn spawn_producers(game: &Game, args: &PlayArgs) -> Result<Vec<Producer>> {
    match &args.script {
        Some(path) => {
            let script = Script::load(path)?;
            tracing::info!("Replaying {} key presses from {}", script.len(), path.display());
            spawn_script_players(game, &script)
        }
        None => spawn_bots(game, args),
    }
}

/// Drive the loop, tallying events as they arrive
fn play(game: &mut Game) -> PlaySummary {
    let mut applied = 0;
    let mut rejected = 0;
    let mut captures = 0;
    let mut last_ms = 0;

    let result = game.run_with(|report| {
        last_ms = report.now_ms;
        for event in &report.events {
            match event {
                GameEvent::Applied { .. } => applied += 1,
                GameEvent::Rejected { .. } => rejected += 1,
                GameEvent::Captured { winner, captured, cell, .. } => {
                    captures += 1;
                    tracing::info!("{} took {} at {}", winner, captured, cell);
                }
                GameEvent::Finished { result, .. } => tracing::info!("Game over: {}", result),
            }
        }
    });

    let scores = game.scoreboard();
    PlaySummary {
        result,
        ticks: game.tick_count(),
        game_ms: last_ms,
        applied,
        rejected,
        captures,
        white_score: scores.white_score,
        black_score: scores.black_score,
        white_log: scores.white_log.clone(),
        black_log: scores.black_log.clone(),
    }
}

fn report_results(summary: &PlaySummary, args: &PlayArgs) {
    if args.json {
        print_json_results(summary);
    } else {
        print_text_results(summary);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn spawn_script_players(game: &Game, keys: &Script) -> Result<Vec<Producer>> {
    let board = game.board();
    let mut producers = Vec::with_capacity(2);

    for color in [Color::White, Color::Black] {
        let controller = PlayerController::new(color, board.cells_high(), board.cells_wide(), Keymap::for_color(color));
        let presses = keys.presses(color);
        let clock = game.clock();
        let snapshot = game.snapshot_handle();
        let sender = game.sender();

        let producer = Producer::spawn(&format!("script-{}", color), move |stop| {
            script::replay(presses, controller, clock, snapshot, sender, stop)
        })
        .with_context(|| format!("Failed to start {} script player", color))?;
        producers.push(producer);
    }
    Ok(producers)
}

fn spawn_bots(game: &Game, args: &PlayArgs) -> Result<Vec<Producer>> {
    let mut rng = create_rng(args.seed);
    let mut producers = Vec::with_capacity(2);

    for color in [Color::White, Color::Black] {
        let bot = RandomBot::new(color, rng.gen()).with_think_time(args.think_ms);
        let clock = game.clock();
        let snapshot = game.snapshot_handle();
        let sender = game.sender();

        let producer = Producer::spawn(&format!("bot-{}", color), move |stop| {
            bot::drive(bot, clock, snapshot, sender, stop)
        })
        .with_context(|| format!("Failed to start {} bot", color))?;
        producers.push(producer);
    }
    Ok(producers)
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn print_json_results(summary: &PlaySummary) {
    if let Ok(json) = serde_json::to_string_pretty(summary) {
        println!("{}", json);
    }
}

fn print_text_results(summary: &PlaySummary) {
    println!("\n=== Game Results ===");
    println!("Result:    {}", summary.result);
    println!("Ticks:     {}", summary.ticks);
    println!("Game time: {}", kfchess_core::events::format_time(summary.game_ms));
    println!(
        "Commands:  {} applied, {} rejected",
        summary.applied, summary.rejected
    );
    println!("Captures:  {}", summary.captures);
    println!("Score:     white {} - black {}", summary.white_score, summary.black_score);

    print_log("White", &summary.white_log);
    print_log("Black", &summary.black_log);
}

fn print_log(side: &str, log: &[String]) {
    println!("\n--- {} moves ---", side);
    if log.is_empty() {
        println!("(none)");
    }
    for line in log {
        println!("{}", line);
    }
}
