//! Event catalog: maps symbolic event names to their topic0 hash.
//!
//! The topic of an EVM event is the keccak256 hash of its canonical
//! signature string, e.g.:
//!   keccak256("PairCreated(address,address,address,uint256)")
//!   → 0x0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9

use std::collections::BTreeMap;

use tiny_keccak::{Hasher, Keccak};

use crate::error::SyncError;

/// Signatures known out of the box.
pub const BUILTIN_SIGNATURES: &[(&str, &str)] = &[
    // Uniswap V2 and its forks (Sushi, Pancake V2, ...)
    ("PairCreated", "PairCreated(address,address,address,uint256)"),
    // Uniswap V3 and its forks
    ("PoolCreated", "PoolCreated(address,address,uint24,int24,address)"),
    // Uniswap V4 PoolManager
    (
        "Initialize",
        "Initialize(bytes32,address,address,uint24,int24,address,uint160,int24)",
    ),
    // Trader Joe Liquidity Book
    ("LBPairCreated", "LBPairCreated(address,address,uint256,address,uint256)"),
];

#[derive(Debug, Clone)]
struct CatalogEntry {
    signature: String,
    topic: String,
}

/// Read-only lookup of event name → topic hash.
#[derive(Debug, Clone)]
pub struct EventCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl EventCatalog {
    /// An empty catalog. Every lookup fails until signatures are added.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The catalog with all built-in signatures.
    pub fn builtin() -> Self {
        BUILTIN_SIGNATURES
            .iter()
            .fold(Self::empty(), |cat, (name, sig)| cat.with_signature(*name, *sig))
    }

    /// Add (or replace) an entry. Used while building the catalog from config.
    pub fn with_signature(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        let signature = signature.into();
        let topic = keccak256_signature(&signature);
        self.entries.insert(name.into(), CatalogEntry { signature, topic });
        self
    }

    /// The topic0 hash for `event_name`.
    pub fn topic_for(&self, event_name: &str) -> Result<&str, SyncError> {
        self.entries
            .get(event_name)
            .map(|e| e.topic.as_str())
            .ok_or_else(|| SyncError::UnknownEvent(event_name.to_string()))
    }

    /// The canonical signature registered under `event_name`, if any.
    pub fn signature_for(&self, event_name: &str) -> Option<&str> {
        self.entries.get(event_name).map(|e| e.signature.as_str())
    }

    /// `(name, signature, topic)` for every entry, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries
            .iter()
            .map(|(name, e)| (name.as_str(), e.signature.as_str(), e.topic.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// keccak256 of a canonical event signature, as a `0x`-prefixed hex string.
pub fn keccak256_signature(signature: &str) -> String {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut output);
    format!("0x{}", hex::encode(output))
}
