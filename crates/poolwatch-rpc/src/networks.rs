//! Network registry: fixed lookup from network id to JSON-RPC endpoint.
//!
//! Built-in entries point at Alchemy's per-network hosts; the API key is
//! appended to the base URL. Entries can be overridden or added from config
//! (e.g. a self-hosted node with no credential).

use std::collections::BTreeMap;

use poolwatch_core::SyncError;

/// Built-in network ids and their endpoint base URLs.
pub const BUILTIN_NETWORKS: &[(&str, &str)] = &[
    ("ethereum", "https://eth-mainnet.g.alchemy.com/v2/"),
    ("base", "https://base-mainnet.g.alchemy.com/v2/"),
    ("arbitrum", "https://arb-mainnet.g.alchemy.com/v2/"),
    ("optimism", "https://opt-mainnet.g.alchemy.com/v2/"),
    ("polygon", "https://polygon-mainnet.g.alchemy.com/v2/"),
    ("bsc", "https://bnb-mainnet.g.alchemy.com/v2/"),
    ("avalanche", "https://avax-mainnet.g.alchemy.com/v2/"),
];

/// Endpoint for one network: base URL plus an optional API credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl NetworkEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    /// The full request URL (`base_url` followed by the credential, if any).
    pub fn url(&self) -> String {
        match &self.api_key {
            Some(key) if !key.is_empty() => format!("{}{}", self.base_url, key),
            _ => self.base_url.clone(),
        }
    }
}

/// Lookup of network id → endpoint.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    endpoints: BTreeMap<String, NetworkEndpoint>,
}

impl NetworkRegistry {
    /// A registry with no networks.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in networks, all sharing `api_key`.
    pub fn builtin(api_key: Option<String>) -> Self {
        let endpoints = BUILTIN_NETWORKS
            .iter()
            .map(|(id, base)| (id.to_string(), NetworkEndpoint::new(*base, api_key.clone())))
            .collect();
        Self { endpoints }
    }

    /// Add or replace the endpoint for `network`.
    pub fn insert(&mut self, network: impl Into<String>, endpoint: NetworkEndpoint) {
        self.endpoints.insert(network.into(), endpoint);
    }

    /// Endpoint for `network`, or `UnsupportedNetwork`.
    pub fn endpoint(&self, network: &str) -> Result<&NetworkEndpoint, SyncError> {
        self.endpoints
            .get(network)
            .ok_or_else(|| SyncError::UnsupportedNetwork(network.to_string()))
    }

    pub fn contains(&self, network: &str) -> bool {
        self.endpoints.contains_key(network)
    }

    /// Known network ids, sorted.
    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }
}
