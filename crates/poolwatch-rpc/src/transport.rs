//! The `RpcTransport` trait: the seam between the chain client and the wire.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Sends JSON-RPC requests to one endpoint.
///
/// Implementations must be `Send + Sync` and are usually shared as
/// `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Identifier for logs. Must not leak credentials.
    fn label(&self) -> &str;
}
