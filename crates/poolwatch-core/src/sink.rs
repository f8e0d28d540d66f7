//! Sink trait: where normalized log records go.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::types::LogRecord;

/// Durable destination for normalized log records.
///
/// The engine advances cursors even when an insert fails, so an
/// implementation that needs stronger delivery must retry internally and
/// tolerate the same record twice.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn insert(&self, record: &LogRecord) -> Result<(), SyncError>;
}
