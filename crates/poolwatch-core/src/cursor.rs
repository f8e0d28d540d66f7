//! Cursor store: the last fully synchronized block per tracking key.
//!
//! The store is a plain key/value map. It does not enforce monotonicity;
//! the engine only ever moves a cursor forward.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SyncError;
use crate::types::TrackingKey;

/// Trait for loading and saving cursors.
///
/// Implementations include `MemoryCursorStore` and `SqliteCursorStore`
/// (in `poolwatch-storage`).
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Last synchronized block for `key`, or `None` if the key was never synced.
    async fn get(&self, key: &TrackingKey) -> Result<Option<u64>, SyncError>;

    /// Record `block_number` as the last synchronized block for `key`.
    async fn set(&self, key: &TrackingKey, block_number: u64) -> Result<(), SyncError>;
}

/// In-memory cursor store. Lives for the process run, no eviction.
#[derive(Default)]
pub struct MemoryCursorStore {
    data: Mutex<HashMap<TrackingKey, u64>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a cursor.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TrackingKey, u64>> {
        // A poisoned map still holds valid block numbers.
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn get(&self, key: &TrackingKey) -> Result<Option<u64>, SyncError> {
        Ok(self.lock().get(key).copied())
    }

    async fn set(&self, key: &TrackingKey, block_number: u64) -> Result<(), SyncError> {
        self.lock().insert(key.clone(), block_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Strategy;

    #[tokio::test]
    async fn absent_until_set() {
        let store = MemoryCursorStore::new();
        let key = TrackingKey::new("ethereum", "0xabc", Strategy::LatestByNumber);

        assert_eq!(store.get(&key).await.unwrap(), None);
        store.set(&key, 100).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(100));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn strategies_are_independent() {
        let store = MemoryCursorStore::new();
        let head = TrackingKey::new("base", "0x1", Strategy::LatestByNumber);
        let fin = TrackingKey::new("base", "0x1", Strategy::LatestByFinalizedBlock);

        store.set(&head, 500).await.unwrap();
        assert_eq!(store.get(&fin).await.unwrap(), None);

        store.set(&fin, 480).await.unwrap();
        assert_eq!(store.get(&head).await.unwrap(), Some(500));
        assert_eq!(store.get(&fin).await.unwrap(), Some(480));
    }

    #[tokio::test]
    async fn store_does_not_enforce_monotonicity() {
        let store = MemoryCursorStore::new();
        let key = TrackingKey::new("ethereum", "0xabc", Strategy::LatestByNumber);
        store.set(&key, 200).await.unwrap();
        store.set(&key, 150).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(150));
    }
}
