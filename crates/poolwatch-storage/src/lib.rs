//! poolwatch-storage: pluggable sinks, cursor stores and target sources.
//!
//! - [`memory`]: in-memory sink (dev/testing, no persistence)
//! - [`sqlite`]: SQLite via `sqlx`, log sink and persistent cursor store
//! - [`targets`]: CSV target list loader

pub mod memory;
pub mod targets;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemorySink;
pub use targets::CsvTargetLoader;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
