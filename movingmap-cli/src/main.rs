//! movingmap CLI - Command-line interface
//!
//! This binary drives the movingmap library: it can locate the tile under a
//! position, prefetch an area into the disk cache, or follow a live aircraft
//! from a telemetry feed.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::follow::FollowArgs;
use commands::locate::LocateArgs;
use commands::prefetch::PrefetchArgs;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "movingmap")]
#[command(version, about = "Slippy-map tile cache for a live moving map", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/movingmap/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the session log (default: ./logs)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tile under a position and whether it is cached
    Locate(LocateArgs),

    /// Download every tile in a square around a position
    Prefetch(PrefetchArgs),

    /// Follow the aircraft from a telemetry feed, fetching tiles as it moves
    Follow(FollowArgs),
}

fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        log_dir: cli.log_dir,
    };

    let result = match cli.command {
        Commands::Locate(args) => {
            runner::load_config(&options).and_then(|config| commands::locate::run(args, &config))
        }
        Commands::Prefetch(args) => commands::prefetch::run(args, &options),
        Commands::Follow(args) => commands::follow::run(args, &options),
    };

    if let Err(e) = result {
        e.exit();
    }
}
