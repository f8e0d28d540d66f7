//! Tracing initialisation for the binary.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Where and how to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default filter directive, used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON structured logs (true) or human-readable text (false)
    pub json: bool,
    /// Also write to this file (truncated first).
    pub file: Option<PathBuf>,
}

/// `RUST_LOG` wins over the configured level; a bad directive falls back to `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Create (or truncate) the log file.
fn open_log_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("cannot open log file {}", path.display()))
}

/// Initialise tracing. Call once, at startup.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let stderr = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file = match &config.file {
        Some(path) => {
            let writer = Mutex::new(open_log_file(path)?);
            Some(if config.json {
                fmt::layer().json().with_ansi(false).with_writer(writer).boxed()
            } else {
                fmt::layer().with_ansi(false).with_writer(writer).boxed()
            })
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(stderr)
        .with(file)
        .try_init()
        .context("tracing already initialised")?;
    Ok(())
}
