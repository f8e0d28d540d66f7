//! `poolwatch run`: wire config into a driver and poll.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use poolwatch_core::{CursorStore, MemoryCursorStore, PollScheduler, Sink, TargetLoader};
use poolwatch_evm::{HttpChainResolver, SyncDriver, SyncDriverBuilder};
use poolwatch_storage::{CsvTargetLoader, MemorySink, SqliteStorage};

use crate::config::{Backend, Config};

pub async fn run(config: &Config, once: bool) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "poolwatch starting");

    let driver = build_driver(config).await?;
    for (network, targets) in driver.networks() {
        info!(network, targets, "tracking network");
    }

    if once {
        let report = driver.run_iteration().await;
        info!(
            networks = report.networks.len(),
            aborted = report.aborted_networks(),
            logs = report.logs(),
            failed_inserts = report.failed_inserts(),
            "single iteration complete"
        );
        if report.aborted_networks() > 0 {
            bail!("{} network(s) failed, see log", report.aborted_networks());
        }
        return Ok(());
    }

    let scheduler = PollScheduler::new(config.scheduler_config());
    driver.run(scheduler, shutdown_signal()).await;
    info!("poolwatch stopped");
    Ok(())
}

async fn build_driver(config: &Config) -> Result<SyncDriver> {
    let loader = CsvTargetLoader::new(&config.targets.path);
    let targets = loader.load().context("loading targets")?;
    if targets.is_empty() {
        bail!("no targets in {}", loader.path().display());
    }

    let registry = config.network_registry().context("building network registry")?;
    let resolver = Arc::new(HttpChainResolver::new(registry, config.http_config()));

    let sqlite = match (config.storage.sink, config.storage.cursors) {
        (Backend::Memory, Backend::Memory) => None,
        _ => Some(
            SqliteStorage::open(&config.storage.path)
                .await
                .with_context(|| format!("opening database {}", config.storage.path))?,
        ),
    };

    let sink: Arc<dyn Sink> = match (&sqlite, config.storage.sink) {
        (Some(db), Backend::Sqlite) => Arc::new(db.clone()),
        _ => {
            warn!("memory sink selected, discovered logs are not persisted");
            Arc::new(MemorySink::new())
        }
    };
    let cursors: Arc<dyn CursorStore> = match (&sqlite, config.storage.cursors) {
        (Some(db), Backend::Sqlite) => Arc::new(db.clone()),
        _ => Arc::new(MemoryCursorStore::new()),
    };

    Ok(SyncDriverBuilder::new(resolver, sink)
        .catalog(config.catalog())
        .cursors(cursors)
        .targets(targets)
        .max_block_range(config.poller.max_block_range)
        .max_concurrent_networks(config.poller.max_concurrent_networks)
        .build())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, finishing current iteration"),
        Err(e) => {
            error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
