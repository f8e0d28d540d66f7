//! Target loader trait: supplies the tracked factories before the engine starts.

use std::collections::HashMap;

use crate::error::SyncError;
use crate::types::Target;

/// Produces the list of tracked targets. Called once at startup; a failure
/// here is fatal.
pub trait TargetLoader {
    fn load(&self) -> Result<Vec<Target>, SyncError>;
}

/// A loader over a fixed, in-memory target list.
#[derive(Debug, Clone, Default)]
pub struct StaticTargetLoader {
    targets: Vec<Target>,
}

impl StaticTargetLoader {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }
}

impl TargetLoader for StaticTargetLoader {
    fn load(&self) -> Result<Vec<Target>, SyncError> {
        Ok(self.targets.clone())
    }
}

/// Pairs of targets that track different events on the same
/// `(network, contract_address)`.
///
/// Such targets share one cursor per strategy, so once the first of them
/// advances it the later one always finds `from > latest` and never fetches.
/// Each pair is `(first target seen, later conflicting target)`.
pub fn shared_cursor_conflicts(targets: &[Target]) -> Vec<(&Target, &Target)> {
    let mut first_seen: HashMap<(&str, &str), &Target> = HashMap::new();
    let mut conflicts = Vec::new();
    for target in targets {
        let slot = (target.network.as_str(), target.contract_address.as_str());
        match first_seen.get(&slot) {
            Some(first) if first.event_name != target.event_name => {
                conflicts.push((*first, target));
            }
            Some(_) => {}
            None => {
                first_seen.insert(slot, target);
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_loader_returns_targets() {
        let loader = StaticTargetLoader::new(vec![Target::new(
            "ethereum",
            "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f",
            "uniswap_v2",
            "PairCreated",
        )]);
        let targets = loader.load().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].exchange_label, "uniswap_v2");
    }

    #[test]
    fn same_contract_with_different_events_conflicts() {
        let targets = vec![
            Target::new("ethereum", "0xfactory", "uniswap_v2", "PairCreated"),
            Target::new("ethereum", "0xfactory", "uniswap_v2", "PairCreated"),
            Target::new("ethereum", "0xfactory", "uniswap_v3", "PoolCreated"),
            // Same address on another network is a different cursor.
            Target::new("base", "0xfactory", "uniswap_v3", "PoolCreated"),
            Target::new("ethereum", "0xother", "sushi", "PoolCreated"),
        ];

        let conflicts = shared_cursor_conflicts(&targets);
        assert_eq!(conflicts.len(), 1);
        let (first, later) = conflicts[0];
        assert_eq!(first.event_name, "PairCreated");
        assert_eq!(later.event_name, "PoolCreated");
        assert_eq!(later.network, "ethereum");
    }

    #[test]
    fn distinct_contracts_do_not_conflict() {
        let targets = vec![
            Target::new("ethereum", "0xa", "x", "PairCreated"),
            Target::new("ethereum", "0xb", "y", "PoolCreated"),
        ];
        assert!(shared_cursor_conflicts(&targets).is_empty());
    }
}
