//! poolwatch-rpc: JSON-RPC plumbing for poolwatch.
//!
//! - [`RpcTransport`]: the async trait the chain client sends requests through
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`HttpRpcClient`]: reqwest-backed transport with timeout and retry
//! - [`NetworkRegistry`]: network id → endpoint URL lookup

pub mod client;
pub mod error;
pub mod networks;
pub mod request;
pub mod retry;
pub mod transport;

pub use client::{HttpClientConfig, HttpRpcClient};
pub use error::TransportError;
pub use networks::{NetworkEndpoint, NetworkRegistry};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::RpcTransport;
