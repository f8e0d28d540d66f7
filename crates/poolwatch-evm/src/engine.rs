//! The per-target sync state machine.
//!
//! For one `(target, strategy)` and the strategy's latest block:
//!
//! 1. resolve the event topic (unknown names never reach the chain client)
//! 2. `from = cursor + 1`, or `latest` for a never-synced key
//! 3. `from > latest` → skip; nothing to fetch, cursor untouched
//! 4. fetch `[from, latest]`, normalize every entry, insert one by one
//!    (a failed insert is logged and does not stop its siblings)
//! 5. advance the cursor to `latest`, whether or not logs were found

use std::sync::Arc;

use tracing::{debug, info, warn};

use poolwatch_core::{CursorStore, EventCatalog, Sink, Strategy, SyncError, Target};

use crate::fetcher::{ChainClient, LogFetcher};

/// Default upper bound on the blocks spanned by one `eth_getLogs` call.
pub const DEFAULT_MAX_BLOCK_RANGE: u64 = 2_000;

/// What one `sync_target` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing new since the cursor.
    Skipped { from: u64, latest: u64 },
    /// Range fetched and cursor advanced to `stats.to`.
    Synced(SyncStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub from: u64,
    pub to: u64,
    pub logs: usize,
    pub failed_inserts: usize,
}

/// Fetch / normalize / persist / advance, for one target at a time.
pub struct SyncEngine {
    catalog: Arc<EventCatalog>,
    cursors: Arc<dyn CursorStore>,
    sink: Arc<dyn Sink>,
    max_block_range: u64,
}

impl SyncEngine {
    pub fn new(
        catalog: Arc<EventCatalog>,
        cursors: Arc<dyn CursorStore>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            catalog,
            cursors,
            sink,
            max_block_range: DEFAULT_MAX_BLOCK_RANGE,
        }
    }

    /// Cap the blocks spanned by a single log query.
    pub fn with_max_block_range(mut self, max_block_range: u64) -> Self {
        self.max_block_range = max_block_range.max(1);
        self
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Run one poll step for `target` under `strategy`.
    ///
    /// On error the cursor is left where it was, so the next iteration
    /// retries the same range.
    pub async fn sync_target(
        &self,
        client: &dyn ChainClient,
        target: &Target,
        strategy: Strategy,
        latest: u64,
    ) -> Result<SyncOutcome, SyncError> {
        let topic = self.catalog.topic_for(&target.event_name)?;
        let key = target.key(strategy);

        let from = match self.cursors.get(&key).await? {
            Some(cursor) => cursor.saturating_add(1),
            None => latest,
        };
        if from > latest {
            debug!(%key, from, latest, "no new blocks");
            return Ok(SyncOutcome::Skipped { from, latest });
        }

        let raw = LogFetcher::new(client, self.max_block_range)
            .logs(&target.contract_address, topic, from, latest)
            .await?;

        // Normalize everything before the first insert so a malformed
        // response leaves the sink untouched.
        let records = raw
            .iter()
            .map(|entry| entry.to_record(target, strategy))
            .collect::<Result<Vec<_>, _>>()?;

        let mut failed_inserts = 0;
        for record in &records {
            if let Err(e) = self.sink.insert(record).await {
                failed_inserts += 1;
                warn!(
                    %key,
                    tx_hash = %record.transaction_hash,
                    log_index = record.log_index,
                    block = record.block_number,
                    error = %e,
                    "sink insert failed"
                );
            }
        }

        self.cursors.set(&key, latest).await?;

        let stats = SyncStats {
            from,
            to: latest,
            logs: records.len(),
            failed_inserts,
        };
        if stats.logs > 0 {
            info!(
                %key,
                exchange = %target.exchange_label,
                from,
                to = latest,
                logs = stats.logs,
                failed_inserts,
                "new pool logs"
            );
        } else {
            debug!(%key, from, to = latest, "range synced, no logs");
        }
        Ok(SyncOutcome::Synced(stats))
    }
}
