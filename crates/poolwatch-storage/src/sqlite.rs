//! SQLite storage backend.
//!
//! One database file holds both the discovered `PoolCreated`/`PairCreated`
//! logs and, when enabled, the per-key block cursors.
//!
//! # Usage
//! ```rust,no_run
//! use poolwatch_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./poolwatch.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use poolwatch_core::{CursorStore, LogRecord, Sink, Strategy, SyncError, TrackingKey};

fn sink_err(e: sqlx::Error) -> SyncError {
    SyncError::Sink(e.to_string())
}

fn cursor_err(e: sqlx::Error) -> SyncError {
    SyncError::Cursor(e.to_string())
}

/// SQLite-backed log sink and cursor store.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./poolwatch.db"`) or a full
    /// SQLite URL (`"sqlite:./poolwatch.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, SyncError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(sink_err)?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database. All data is lost on drop.
    pub async fn in_memory() -> Result<Self, SyncError> {
        // Every connection to `sqlite::memory:` is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(sink_err)?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), SyncError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(sink_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pool_created_logs (
                network           TEXT    NOT NULL,
                strategy          TEXT    NOT NULL,
                transaction_hash  TEXT    NOT NULL,
                log_index         INTEGER NOT NULL,
                transaction_index INTEGER NOT NULL,
                removed           INTEGER NOT NULL,
                block_number      INTEGER NOT NULL,
                block_hash        TEXT    NOT NULL,
                exchange_label    TEXT    NOT NULL,
                inserted_at       INTEGER NOT NULL,
                PRIMARY KEY (network, strategy, transaction_hash, log_index)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(sink_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pool_logs_block
             ON pool_created_logs (network, block_number);",
        )
        .execute(&self.pool)
        .await
        .map_err(sink_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cursors (
                network          TEXT    NOT NULL,
                contract_address TEXT    NOT NULL,
                strategy         TEXT    NOT NULL,
                block_number     INTEGER NOT NULL,
                updated_at       INTEGER NOT NULL,
                PRIMARY KEY (network, contract_address, strategy)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(sink_err)?;

        Ok(())
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// All stored records for `network`, ordered by block then log index.
    pub async fn records(&self, network: &str) -> Result<Vec<LogRecord>, SyncError> {
        let rows = sqlx::query(
            "SELECT network, strategy, transaction_hash, log_index, transaction_index,
                    removed, block_number, block_hash, exchange_label
             FROM pool_created_logs
             WHERE network = ?
             ORDER BY block_number ASC, log_index ASC, strategy ASC",
        )
        .bind(network)
        .fetch_all(&self.pool)
        .await
        .map_err(sink_err)?;

        rows.iter()
            .map(|row| {
                let strategy: String = row.try_get("strategy").map_err(sink_err)?;
                let strategy = strategy.parse::<Strategy>().map_err(SyncError::Sink)?;
                Ok(LogRecord {
                    transaction_index: row.try_get::<i64, _>("transaction_index").map_err(sink_err)? as u64,
                    transaction_hash: row.try_get("transaction_hash").map_err(sink_err)?,
                    log_index: row.try_get::<i64, _>("log_index").map_err(sink_err)? as u64,
                    removed: row.try_get::<i64, _>("removed").map_err(sink_err)? != 0,
                    block_number: row.try_get::<i64, _>("block_number").map_err(sink_err)? as u64,
                    block_hash: row.try_get("block_hash").map_err(sink_err)?,
                    exchange_label: row.try_get("exchange_label").map_err(sink_err)?,
                    network: row.try_get("network").map_err(sink_err)?,
                    strategy,
                })
            })
            .collect()
    }

    /// Total number of stored records across all networks.
    pub async fn record_count(&self) -> Result<u64, SyncError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM pool_created_logs")
            .fetch_one(&self.pool)
            .await
            .map_err(sink_err)?;
        let n: i64 = row.try_get("n").map_err(sink_err)?;
        Ok(n as u64)
    }
}

#[async_trait]
impl Sink for SqliteStorage {
    async fn insert(&self, record: &LogRecord) -> Result<(), SyncError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO pool_created_logs
                (network, strategy, transaction_hash, log_index, transaction_index,
                 removed, block_number, block_hash, exchange_label, inserted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.network)
        .bind(record.strategy.as_str())
        .bind(&record.transaction_hash)
        .bind(record.log_index as i64)
        .bind(record.transaction_index as i64)
        .bind(record.removed as i64)
        .bind(record.block_number as i64)
        .bind(&record.block_hash)
        .bind(&record.exchange_label)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(sink_err)?;

        if result.rows_affected() == 0 {
            debug!(
                network = %record.network,
                tx = %record.transaction_hash,
                log_index = record.log_index,
                "duplicate log ignored"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl CursorStore for SqliteStorage {
    async fn get(&self, key: &TrackingKey) -> Result<Option<u64>, SyncError> {
        let row = sqlx::query(
            "SELECT block_number FROM cursors
             WHERE network = ? AND contract_address = ? AND strategy = ?",
        )
        .bind(&key.network)
        .bind(&key.contract_address)
        .bind(key.strategy.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(cursor_err)?;

        match row {
            Some(row) => {
                let n: i64 = row.try_get("block_number").map_err(cursor_err)?;
                Ok(Some(n as u64))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &TrackingKey, block_number: u64) -> Result<(), SyncError> {
        sqlx::query(
            "INSERT OR REPLACE INTO cursors
                (network, contract_address, strategy, block_number, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&key.network)
        .bind(&key.contract_address)
        .bind(key.strategy.as_str())
        .bind(block_number as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(cursor_err)?;

        debug!(key = %key, block = block_number, "cursor saved");
        Ok(())
    }
}
