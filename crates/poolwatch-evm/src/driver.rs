//! The top-level poll driver.
//!
//! One iteration:
//! - for every network (bounded fan-out, default one at a time):
//!   - resolve the network's chain client (unknown network → skip it)
//!   - for every strategy: query the latest block once, then run the
//!     sync engine for every target on that network
//! - hand the iteration report to the scheduler, sleep, repeat
//!
//! A chain error aborts the network for the current iteration only. An
//! unknown event skips just its target. Nothing here ends the loop.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use poolwatch_core::{shared_cursor_conflicts, PollScheduler, Strategy, SyncError, Target};

use crate::engine::{SyncEngine, SyncOutcome};
use crate::fetcher::ChainClient;

/// Resolves a network id to a chain client.
pub trait ChainResolver: Send + Sync {
    /// Fails with `UnsupportedNetwork` for unknown ids. Must not touch the network.
    fn resolve(&self, network: &str) -> Result<Arc<dyn ChainClient>, SyncError>;
}

/// Outcome of one network within one iteration.
#[derive(Debug, Default)]
pub struct NetworkReport {
    pub network: String,
    pub synced: usize,
    pub skipped: usize,
    /// Targets dropped this iteration for config faults (unknown event).
    pub target_errors: usize,
    pub logs: usize,
    pub failed_inserts: usize,
    /// Set when the network's processing was aborted.
    pub error: Option<SyncError>,
}

impl NetworkReport {
    fn new(network: &str) -> Self {
        Self {
            network: network.to_string(),
            ..Self::default()
        }
    }
}

/// Summary of one full pass over all networks.
#[derive(Debug, Default)]
pub struct IterationReport {
    pub networks: Vec<NetworkReport>,
}

impl IterationReport {
    pub fn logs(&self) -> usize {
        self.networks.iter().map(|n| n.logs).sum()
    }

    pub fn failed_inserts(&self) -> usize {
        self.networks.iter().map(|n| n.failed_inserts).sum()
    }

    pub fn aborted_networks(&self) -> usize {
        self.networks.iter().filter(|n| n.error.is_some()).count()
    }

    /// `true` if a network failed for a reason that waiting might fix.
    ///
    /// Config faults (unsupported network) repeat every iteration regardless,
    /// so they do not push the scheduler into backoff.
    pub fn should_back_off(&self) -> bool {
        self.networks
            .iter()
            .filter_map(|n| n.error.as_ref())
            .any(|e| !e.is_config_error())
    }
}

/// Drives the sync engine over every target, forever.
pub struct SyncDriver {
    engine: SyncEngine,
    resolver: Arc<dyn ChainResolver>,
    by_network: BTreeMap<String, Vec<Target>>,
    max_concurrent_networks: usize,
}

impl SyncDriver {
    pub fn new(engine: SyncEngine, resolver: Arc<dyn ChainResolver>, targets: Vec<Target>) -> Self {
        for (first, later) in shared_cursor_conflicts(&targets) {
            warn!(
                network = %later.network,
                contract = %later.contract_address,
                event = %later.event_name,
                shadowed_by = %first.event_name,
                "target shares a cursor with another event on the same contract and will never fetch"
            );
        }

        let mut by_network: BTreeMap<String, Vec<Target>> = BTreeMap::new();
        for target in targets {
            by_network.entry(target.network.clone()).or_default().push(target);
        }
        Self {
            engine,
            resolver,
            by_network,
            max_concurrent_networks: 1,
        }
    }

    /// Process up to `n` networks concurrently. Each network is still handled
    /// by a single task, so per-key cursor updates stay serialized.
    pub fn with_max_concurrent_networks(mut self, n: usize) -> Self {
        self.max_concurrent_networks = n.max(1);
        self
    }

    /// Network ids, sorted, with their target counts.
    pub fn networks(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_network.iter().map(|(n, t)| (n.as_str(), t.len()))
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// One pass over every network.
    pub async fn run_iteration(&self) -> IterationReport {
        let networks = stream::iter(self.by_network.iter())
            .map(|(network, targets)| self.sync_network(network, targets))
            .buffered(self.max_concurrent_networks)
            .collect::<Vec<_>>()
            .await;
        IterationReport { networks }
    }

    /// Loop forever, sleeping between iterations as `scheduler` decides.
    /// Returns once `shutdown` resolves; an in-flight iteration is finished first.
    pub async fn run<F>(&self, mut scheduler: PollScheduler, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut iteration: u64 = 0;
        loop {
            iteration += 1;
            let report = self.run_iteration().await;
            let delay = scheduler.next_delay(report.should_back_off());
            info!(
                iteration,
                networks = report.networks.len(),
                aborted = report.aborted_networks(),
                logs = report.logs(),
                failed_inserts = report.failed_inserts(),
                next_in_ms = delay.as_millis() as u64,
                "iteration complete"
            );

            tokio::select! {
                _ = &mut shutdown => {
                    info!(iteration, "shutdown requested, stopping poll loop");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn sync_network(&self, network: &str, targets: &[Target]) -> NetworkReport {
        let mut report = NetworkReport::new(network);

        let client = match self.resolver.resolve(network) {
            Ok(c) => c,
            Err(e) => {
                error!(network, targets = targets.len(), error = %e, "cannot resolve network, skipping");
                report.error = Some(e);
                return report;
            }
        };

        for strategy in Strategy::ALL {
            let latest = match client.current_block(strategy).await {
                Ok(n) => n,
                Err(e) => {
                    error!(network, %strategy, error = %e, "latest block query failed, aborting network");
                    report.error = Some(e);
                    return report;
                }
            };

            for target in targets {
                match self
                    .engine
                    .sync_target(client.as_ref(), target, strategy, latest)
                    .await
                {
                    Ok(SyncOutcome::Skipped { .. }) => report.skipped += 1,
                    Ok(SyncOutcome::Synced(stats)) => {
                        report.synced += 1;
                        report.logs += stats.logs;
                        report.failed_inserts += stats.failed_inserts;
                    }
                    Err(e) if e.is_config_error() => {
                        warn!(
                            key = %target.key(strategy),
                            event = %target.event_name,
                            error = %e,
                            "skipping target"
                        );
                        report.target_errors += 1;
                    }
                    Err(e) => {
                        error!(
                            network,
                            %strategy,
                            key = %target.key(strategy),
                            latest,
                            error = %e,
                            "sync failed, aborting network for this iteration"
                        );
                        report.error = Some(e);
                        return report;
                    }
                }
            }
        }
        report
    }
}
