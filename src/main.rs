//! Brine CLI - run headless matches, inspect replays, generate maps.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Brine - a deterministic round engine for grid games
#[derive(Parser, Debug)]
#[command(name = "brine")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a headless match with the built-in demo policy
    Run {
        /// Map file (JSON); generated from the seed when omitted
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Seed for generated maps (default: 42)
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Generated map edge length (default: 24)
        #[arg(long, default_value = "24")]
        size: i32,

        /// Override the map's round limit
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Save the replay recording to a file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Summarize a recorded match
    Replay {
        /// Recording file (JSON)
        #[arg(required = true)]
        recording: PathBuf,
    },

    /// Generate a map and write it to a file
    Genmap {
        /// Output path
        #[arg(required = true)]
        out: PathBuf,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Map edge length
        #[arg(long, default_value = "24")]
        size: i32,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            map,
            seed,
            size,
            rounds,
            save,
            quiet,
        } => cli::run::execute(map, seed, size, rounds, save, quiet),

        Commands::Replay { recording } => cli::replay::execute(&recording),

        Commands::Genmap { out, seed, size } => cli::genmap::execute(&out, seed, size),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
