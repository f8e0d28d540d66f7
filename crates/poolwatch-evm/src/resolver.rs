//! HTTP-backed `ChainResolver`: network registry → cached `RpcChainClient`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use poolwatch_core::SyncError;
use poolwatch_rpc::{HttpClientConfig, HttpRpcClient, NetworkRegistry};

use crate::client::RpcChainClient;
use crate::driver::ChainResolver;
use crate::fetcher::ChainClient;

/// Builds one HTTP chain client per network on first use and reuses it.
pub struct HttpChainResolver {
    registry: NetworkRegistry,
    http: HttpClientConfig,
    clients: Mutex<HashMap<String, Arc<dyn ChainClient>>>,
}

impl HttpChainResolver {
    pub fn new(registry: NetworkRegistry, http: HttpClientConfig) -> Self {
        Self {
            registry,
            http,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }
}

impl ChainResolver for HttpChainResolver {
    fn resolve(&self, network: &str) -> Result<Arc<dyn ChainClient>, SyncError> {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = clients.get(network) {
            return Ok(Arc::clone(client));
        }

        let endpoint = self.registry.endpoint(network)?;
        let transport = HttpRpcClient::new(endpoint.url(), self.http.clone())?;
        let client = RpcChainClient::new(Arc::new(transport));
        debug!(network, endpoint = %client.label(), "chain client created");

        let client: Arc<dyn ChainClient> = Arc::new(client);
        clients.insert(network.to_string(), Arc::clone(&client));
        Ok(client)
    }
}
