//! Validate command - load a catalogue and check its starting position

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use kfchess_core::{Catalogue, CatalogueConfig, Color, Game};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct ValidateArgs {
    /// Piece catalogue directory
    #[arg(long, value_name = "DIR", default_value = "pieces")]
    pub pieces: PathBuf,

    /// Output the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct CatalogueSummary {
    root: String,
    rows: i32,
    cols: i32,
    types: Vec<String>,
    /// State names per piece type
    states: BTreeMap<String, Vec<String>>,
    white_pieces: usize,
    black_pieces: usize,
    /// Pieces with at least one legal move at the start
    mobile_pieces: usize,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: ValidateArgs) -> Result<()> {
    let catalogue = Catalogue::load(&args.pieces, CatalogueConfig::default())
        .with_context(|| format!("Failed to load catalogue: {}", args.pieces.display()))?;
    let pieces = catalogue.spawn_pieces().context("Failed to spawn pieces")?;
    let game = Game::new(pieces, catalogue.board().clone()).context("Invalid starting layout")?;

    let summary = summarize(&catalogue, &game);
    tracing::info!(
        "Catalogue OK: {} types, {} pieces",
        summary.types.len(),
        game.piece_count()
    );

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
        println!("{}", json);
    } else {
        print_text_summary(&summary);
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - STEPS
// ============================================================================

fn summarize(catalogue: &Catalogue, game: &Game) -> CatalogueSummary {
    let factory = catalogue.factory();
    let types: Vec<String> = factory.type_codes().map(str::to_string).collect();

    let states: BTreeMap<String, Vec<String>> = game
        .pieces()
        .map(|p| {
            let names = factory
                .graph(p.code())
                .map(|g| g.states().iter().map(|s| s.name.clone()).collect::<Vec<_>>())
                .unwrap_or_default();
            (p.code().to_string(), names)
        })
        .collect();

    let count = |color: Color| game.pieces().filter(|p| p.color() == color).count();
    let mobile_pieces = game
        .pieces()
        .filter(|p| game.valid_moves(p.id()).map_or(false, |moves| !moves.is_empty()))
        .count();

    CatalogueSummary {
        root: catalogue.root().display().to_string(),
        rows: catalogue.board().cells_high(),
        cols: catalogue.board().cells_wide(),
        types,
        states,
        white_pieces: count(Color::White),
        black_pieces: count(Color::Black),
        mobile_pieces,
    }
}

fn print_text_summary(summary: &CatalogueSummary) {
    println!("\n=== Catalogue ===");
    println!("Root:    {}", summary.root);
    println!("Board:   {} rows x {} cols", summary.rows, summary.cols);
    println!("Types:   {}", summary.types.join(" "));
    println!("Pieces:  {} white, {} black", summary.white_pieces, summary.black_pieces);
    println!("Mobile:  {}", summary.mobile_pieces);
    for (code, states) in &summary.states {
        println!("  {}: {}", code, states.join(", "));
    }
}
