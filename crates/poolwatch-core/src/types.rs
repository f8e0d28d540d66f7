//! Shared types for the sync pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─── Target ──────────────────────────────────────────────────────────────────

/// A factory contract whose creation events we track on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Network slug (e.g. `"ethereum"`).
    pub network: String,
    /// Factory contract address (`0x…`).
    pub contract_address: String,
    /// Human label of the exchange (e.g. `"uniswap_v2"`).
    pub exchange_label: String,
    /// Symbolic event name, resolved through the `EventCatalog`.
    pub event_name: String,
}

impl Target {
    pub fn new(
        network: impl Into<String>,
        contract_address: impl Into<String>,
        exchange_label: impl Into<String>,
        event_name: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            contract_address: contract_address.into(),
            exchange_label: exchange_label.into(),
            event_name: event_name.into(),
        }
    }

    /// The cursor key for this target under `strategy`.
    pub fn key(&self, strategy: Strategy) -> TrackingKey {
        TrackingKey::new(&self.network, &self.contract_address, strategy)
    }
}

// ─── Strategy ────────────────────────────────────────────────────────────────

/// How the "latest known block" of a network is determined.
///
/// Both strategies run side by side with independent cursors, so a provider
/// that stalls on one method does not stall discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Chain head via `eth_blockNumber`.
    LatestByNumber,
    /// Finalized block via `eth_getBlockByNumber("finalized")`.
    LatestByFinalizedBlock,
}

impl Strategy {
    /// Every strategy, in the order the driver runs them.
    pub const ALL: [Strategy; 2] = [Strategy::LatestByNumber, Strategy::LatestByFinalizedBlock];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatestByNumber => "latest-by-number",
            Self::LatestByFinalizedBlock => "latest-by-finalized-block",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest-by-number" => Ok(Self::LatestByNumber),
            "latest-by-finalized-block" => Ok(Self::LatestByFinalizedBlock),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

// ─── TrackingKey ─────────────────────────────────────────────────────────────

/// Identity of one cursor: `(network, contract, strategy)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingKey {
    pub network: String,
    pub contract_address: String,
    pub strategy: Strategy,
}

impl TrackingKey {
    pub fn new(
        network: impl Into<String>,
        contract_address: impl Into<String>,
        strategy: Strategy,
    ) -> Self {
        Self {
            network: network.into(),
            contract_address: contract_address.into(),
            strategy,
        }
    }
}

impl fmt::Display for TrackingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.network, self.contract_address, self.strategy)
    }
}

// ─── LogRecord ───────────────────────────────────────────────────────────────

/// A normalized pool-creation log, ready for the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub transaction_index: u64,
    pub transaction_hash: String,
    pub log_index: u64,
    /// Passed through from the node; `true` means the log was dropped by a reorg.
    pub removed: bool,
    pub block_number: u64,
    pub block_hash: String,
    pub exchange_label: String,
    pub network: String,
    pub strategy: Strategy,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
