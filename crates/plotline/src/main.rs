//! Plotline command-line tool.
//!
//! Run with: cargo run -p plotline -- <command>
//!
//! Examples:
//!   cargo run -p plotline -- normalize --response reply.txt --narrative story.txt
//!   cargo run -p plotline -- recompute --story story.json --out derived.json
//!   cargo run -p plotline -- check --story story.json
//!   cargo run -p plotline -- config > plotline.toml

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use config::PlotlineConfig;

/// Narrative timeline engine
#[derive(Parser, Debug)]
#[command(name = "plotline", version)]
#[command(about = "Turns narratives into per-character event timelines")]
struct Cli {
    /// Configuration file (defaults to ./plotline.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a raw model response and normalize it into a story
    Normalize {
        /// Raw response text
        #[arg(long)]
        response: PathBuf,
        /// Narrative text the response was extracted from
        #[arg(long)]
        narrative: PathBuf,
        /// Existing story whose id and title are kept
        #[arg(long)]
        story: Option<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Re-derive the cumulative state of a story
    Recompute {
        #[arg(long)]
        story: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Report counts and broken references in a story
    Check {
        #[arg(long)]
        story: PathBuf,
    },

    /// Print the default configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(output: &str, out: Option<&Path>) -> std::io::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, output)?;
            tracing::info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            println!("{}", output);
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Normalize {
            response,
            narrative,
            story,
            out,
        } => {
            let config = PlotlineConfig::load(cli.config.as_deref())?;
            let output = commands::normalize(&config, &response, &narrative, story.as_deref())?;
            emit(&output, out.as_deref())?;
        }
        Command::Recompute { story, out } => {
            let config = PlotlineConfig::load(cli.config.as_deref())?;
            let output = commands::recompute(&config, &story)?;
            emit(&output, out.as_deref())?;
        }
        Command::Check { story } => {
            emit(&commands::check(&story)?, None)?;
        }
        Command::Config => {
            emit(&commands::default_config()?, None)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
