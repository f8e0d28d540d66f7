//! poolwatch CLI: discover newly created DEX pools across EVM networks.
//!
//! # Commands
//! ```text
//! poolwatch run    [--once] [--interval-ms <ms>]
//! poolwatch check
//! poolwatch topics
//! ```
//!
//! Global flags: `--config <path>` (default `poolwatch.toml`),
//! `--targets <csv>`, `--log-level <directive>`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod cmd_check;
mod cmd_run;
mod config;
mod logging;

use crate::config::Config;
use crate::logging::{init_tracing, LogConfig};

const DEFAULT_CONFIG: &str = "poolwatch.toml";

#[derive(Parser)]
#[command(
    name = "poolwatch",
    about = "Poll DEX factory contracts for new pools across EVM networks",
    long_about = "
poolwatch polls each network's JSON-RPC endpoint for PairCreated / PoolCreated
logs of the factories listed in a CSV file, and records every new log once.

ENVIRONMENT VARIABLES:
  POOLWATCH_API_KEY   RPC credential shared by the built-in networks
  RUST_LOG            Log filter (overrides the configured level)
",
    version
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Target CSV file (overrides `targets.path`)
    #[arg(long, global = true)]
    targets: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "poolwatch_evm=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll forever (the default command)
    Run {
        /// Run a single iteration and exit
        #[arg(long)]
        once: bool,
        /// Delay between clean iterations (overrides `poller.interval_ms`)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Validate config and targets; resolve every event and network without RPC
    Check,

    /// Print the event catalog (name, signature, topic0)
    Topics,
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return Config::load(path).with_context(|| format!("loading {}", path.display()));
    }
    if path != Path::new(DEFAULT_CONFIG) {
        anyhow::bail!("config file {} not found", path.display());
    }
    Config::parse("").context("building default config")
}

fn init_logging(config: &Config) -> Result<()> {
    init_tracing(&LogConfig {
        level: config.logging.level.clone(),
        json: config.logging.json,
        file: config.logging.file.clone(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(path) = cli.targets {
        config.targets.path = path;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    match cli.command.unwrap_or(Commands::Run {
        once: false,
        interval_ms: None,
    }) {
        Commands::Run { once, interval_ms } => {
            if let Some(ms) = interval_ms {
                config.poller.interval_ms = ms;
            }
            init_logging(&config)?;
            cmd_run::run(&config, once).await
        }

        Commands::Check => cmd_check::run(&config),

        Commands::Topics => cmd_topics(&config),
    }
}

fn cmd_topics(config: &Config) -> Result<()> {
    let catalog = config.catalog();
    println!("{} event(s):", catalog.len());
    for (name, signature, topic) in catalog.iter() {
        println!("  {name:<16} {topic}  {signature}");
    }
    Ok(())
}
