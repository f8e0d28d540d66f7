//! poolwatch-evm: EVM chain client and the incremental sync engine.
//!
//! ```text
//! SyncDriver ── per network ──► ChainResolver ──► ChainClient (RpcChainClient)
//!     │                                               │
//!     └── per strategy, per target ──► SyncEngine ◄───┘
//!                                        ├── EventCatalog
//!                                        ├── CursorStore
//!                                        └── Sink
//! ```

pub mod builder;
pub mod client;
pub mod driver;
pub mod engine;
pub mod fetcher;
pub mod resolver;

pub use builder::SyncDriverBuilder;
pub use client::RpcChainClient;
pub use driver::{ChainResolver, IterationReport, NetworkReport, SyncDriver};
pub use engine::{SyncEngine, SyncOutcome, SyncStats};
pub use fetcher::{parse_hex_u64, ChainClient, LogFetcher, RawLogEntry};
pub use resolver::HttpChainResolver;
