//! GridBridge CLI - Command-line interface
//!
//! Inspects how a configured tile grid maps onto a geodetic tiling scheme.

mod commands;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gridbridge::coord::TileCoordinate;
use gridbridge::logging::{init_logging, LoggingGuard};

use crate::commands::common::{build_provider, load_config};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "gridbridge")]
#[command(version = gridbridge::VERSION)]
#[command(about = "Inspect how a tiled raster grid maps onto a geodetic tiling scheme", long_about = None)]
struct Cli {
    /// Config file (default: ~/.gridbridge/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file (cleared on start)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tiling scheme derived from the configured grid
    Scheme {
        /// Last level to list tile counts for (default: grid maximum)
        #[arg(long)]
        max_level: Option<i32>,
    },

    /// Show the area covered by a tile (renderer row order)
    Tile {
        #[arg(long)]
        x: i64,

        #[arg(long)]
        y: i64,

        #[arg(long)]
        level: i32,
    },

    /// Find the tile containing a position
    Locate {
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long)]
        level: i32,
    },
}

fn main() {
    let cli = Cli::parse();
    let logging = start_logging(cli.verbose, cli.log_file.as_deref());

    if let Err(e) = run(cli) {
        // exit skips destructors, flush the log file first
        drop(logging);
        e.exit();
    }
}

/// Starts logging, falling back to stderr only if the log file is unusable.
fn start_logging(verbose: bool, log_file: Option<&Path>) -> Option<LoggingGuard> {
    match init_logging(verbose, log_file) {
        Ok(guard) => Some(guard),
        Err(e) if log_file.is_some() => {
            eprintln!("Warning: file logging disabled: {}", e);
            init_logging(verbose, None).ok()
        }
        Err(_) => None,
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let provider = build_provider(&config)?;

    match cli.command {
        Commands::Scheme { max_level } => commands::scheme::run(&provider, max_level),
        Commands::Tile { x, y, level } => {
            commands::tile::run(&provider, TileCoordinate::new(level, x, y))
        }
        Commands::Locate { lon, lat, level } => commands::locate::run(&provider, lon, lat, level),
    }
}
