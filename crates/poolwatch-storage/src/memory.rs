//! In-memory sink.
//!
//! Keeps every inserted record in RAM. Can be told to reject records
//! matching a predicate, which is how the engine's partial-failure path
//! is exercised in tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use poolwatch_core::{LogRecord, Sink, SyncError};

type RejectFn = Box<dyn Fn(&LogRecord) -> bool + Send + Sync>;

/// In-memory log sink. All data is lost when the process exits.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
    attempts: AtomicUsize,
    reject: Option<RejectFn>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that fails every insert for which `reject` returns `true`.
    pub fn rejecting<F>(reject: F) -> Self
    where
        F: Fn(&LogRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            reject: Some(Box::new(reject)),
            ..Self::default()
        }
    }

    /// Records accepted so far, in insertion order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Number of accepted records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `insert` calls, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn insert(&self, record: &LogRecord) -> Result<(), SyncError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.reject.as_ref().is_some_and(|reject| reject(record)) {
            return Err(SyncError::Sink(format!(
                "rejected {}:{}",
                record.transaction_hash, record.log_index
            )));
        }
        self.lock().push(record.clone());
        Ok(())
    }
}
