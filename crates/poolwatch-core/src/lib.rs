//! poolwatch-core: foundation for the incremental pool-creation log poller.
//!
//! # Architecture
//!
//! ```text
//! TargetLoader → SyncDriver (per iteration, per network)
//!                    ├── ChainClient     (current block / ranged logs)
//!                    ├── EventCatalog    (event name → topic0)
//!                    ├── CursorStore     (tracking key → last synced block)
//!                    ├── Sink            (normalized LogRecord inserts)
//!                    └── PollScheduler   (interval, backoff, jitter)
//! ```
//!
//! This crate holds the chain-agnostic pieces. The JSON-RPC transport lives
//! in `poolwatch-rpc` and the engine itself in `poolwatch-evm`.

pub mod catalog;
pub mod cursor;
pub mod error;
pub mod loader;
pub mod schedule;
pub mod sink;
pub mod types;

pub use catalog::EventCatalog;
pub use cursor::{CursorStore, MemoryCursorStore};
pub use error::SyncError;
pub use loader::{shared_cursor_conflicts, StaticTargetLoader, TargetLoader};
pub use schedule::{PollScheduler, SchedulerConfig};
pub use sink::Sink;
pub use types::{LogRecord, Strategy, Target, TrackingKey};
