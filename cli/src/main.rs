use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod output;
mod storage;

use crate::commands::{contract, inspect};

#[derive(Parser)]
#[command(name = "supplyctl")]
#[command(about = "Command-line interface for a two-period supply contract")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (human, json)
    #[arg(short, long, global = true)]
    format: Option<output::OutputFormat>,

    /// Directory holding the contract state
    #[arg(long, global = true, env = "SUPPLYCTL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Contract(contract::ContractCommands),
    #[command(flatten)]
    Inspect(inspect::InspectCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Flags win over the config file
    let config = config::Config::load()?;
    let format = cli.format.or(config.format).unwrap_or_default();
    let data_dir = cli.data_dir.or(config.data_dir);
    debug!(%format, ?data_dir, "resolved settings");

    let storage = storage::Storage::new(data_dir.as_deref())?;
    debug!(path = %storage.path().display(), "using state file");

    match cli.command {
        Commands::Contract(command) => contract::execute(command, &storage, format)?,
        Commands::Inspect(command) => inspect::execute(command, &storage, format)?,
    }

    Ok(())
}
