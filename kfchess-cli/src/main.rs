//! KFChess CLI - Command-line interface
//!
//! Commands:
//! - play: Run a headless real-time game driven by bots or a key script
//! - validate: Load a piece catalogue and check the starting layout

mod bot;
mod play_cmd;
mod script;
mod validate_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kfchess")]
#[command(about = "Real-time chess without turns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a headless game
    Play(play_cmd::PlayArgs),
    /// Validate a piece catalogue
    Validate(validate_cmd::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args),
        Commands::Validate(args) => validate_cmd::run(args),
    }
}
