//! Fluent builder for a `SyncDriver`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use poolwatch_core::{EventCatalog, Target};
//! use poolwatch_evm::{HttpChainResolver, SyncDriverBuilder};
//! use poolwatch_rpc::{HttpClientConfig, NetworkRegistry};
//! # fn sink() -> Arc<dyn poolwatch_core::Sink> { unimplemented!() }
//!
//! let resolver = HttpChainResolver::new(
//!     NetworkRegistry::builtin(Some("API_KEY".into())),
//!     HttpClientConfig::default(),
//! );
//! let driver = SyncDriverBuilder::new(Arc::new(resolver), sink())
//!     .catalog(EventCatalog::builtin())
//!     .max_block_range(500)
//!     .targets(vec![Target::new(
//!         "ethereum",
//!         "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f",
//!         "uniswap_v2",
//!         "PairCreated",
//!     )])
//!     .build();
//! ```

use std::sync::Arc;

use poolwatch_core::{CursorStore, EventCatalog, MemoryCursorStore, Sink, Target};

use crate::driver::{ChainResolver, SyncDriver};
use crate::engine::{SyncEngine, DEFAULT_MAX_BLOCK_RANGE};

/// Fluent builder for `SyncDriver`.
///
/// Defaults: built-in event catalog, in-memory cursors, 2000-block log
/// queries, one network at a time.
pub struct SyncDriverBuilder {
    resolver: Arc<dyn ChainResolver>,
    sink: Arc<dyn Sink>,
    catalog: EventCatalog,
    cursors: Arc<dyn CursorStore>,
    targets: Vec<Target>,
    max_block_range: u64,
    max_concurrent_networks: usize,
}

impl SyncDriverBuilder {
    pub fn new(resolver: Arc<dyn ChainResolver>, sink: Arc<dyn Sink>) -> Self {
        Self {
            resolver,
            sink,
            catalog: EventCatalog::builtin(),
            cursors: Arc::new(MemoryCursorStore::new()),
            targets: vec![],
            max_block_range: DEFAULT_MAX_BLOCK_RANGE,
            max_concurrent_networks: 1,
        }
    }

    pub fn catalog(mut self, catalog: EventCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Use a specific cursor store (e.g. a persistent one).
    pub fn cursors(mut self, cursors: Arc<dyn CursorStore>) -> Self {
        self.cursors = cursors;
        self
    }

    pub fn targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    pub fn max_block_range(mut self, blocks: u64) -> Self {
        self.max_block_range = blocks;
        self
    }

    pub fn max_concurrent_networks(mut self, n: usize) -> Self {
        self.max_concurrent_networks = n;
        self
    }

    pub fn build(self) -> SyncDriver {
        let engine = SyncEngine::new(Arc::new(self.catalog), self.cursors, self.sink)
            .with_max_block_range(self.max_block_range);
        SyncDriver::new(engine, self.resolver, self.targets)
            .with_max_concurrent_networks(self.max_concurrent_networks)
    }
}
