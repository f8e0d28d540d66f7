//! `ChainClient` over any JSON-RPC transport.
//!
//! Methods used:
//! - `eth_blockNumber`                        → chain head
//! - `eth_getBlockByNumber("finalized", false)` → finalized block (`result.number`)
//! - `eth_getLogs`                            → ranged single-address, single-topic query

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use poolwatch_core::{Strategy, SyncError};
use poolwatch_rpc::{JsonRpcRequest, RpcId, RpcTransport};

use crate::fetcher::{parse_hex_u64, to_hex, ChainClient, RawLogEntry};

/// Chain client bound to one endpoint.
///
/// Request ids come from a sequence owned by this client, starting at 1.
pub struct RpcChainClient {
    transport: Arc<dyn RpcTransport>,
    next_id: AtomicU64,
}

impl RpcChainClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint label (credentials stripped).
    pub fn label(&self) -> &str {
        self.transport.label()
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SyncError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let resp = self
            .transport
            .send(JsonRpcRequest::new(id, method, params))
            .await?;

        let id_matches = match &resp.id {
            RpcId::Number(n) => *n == id,
            RpcId::String(s) => s.parse::<u64>().map_or(false, |n| n == id),
            RpcId::Null => false,
        };
        if !id_matches && resp.error.is_none() {
            return Err(SyncError::Protocol(format!(
                "{method}: response id {} does not match request id {id}",
                resp.id
            )));
        }

        resp.into_result()
            .map_err(|e| SyncError::Protocol(format!("{method}: {e}")))
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn current_block(&self, strategy: Strategy) -> Result<u64, SyncError> {
        match strategy {
            Strategy::LatestByNumber => {
                let result = self.call("eth_blockNumber", vec![]).await?;
                let hex = result.as_str().ok_or_else(|| {
                    SyncError::Protocol(format!("eth_blockNumber: expected hex string, got {result}"))
                })?;
                parse_hex_u64(hex)
            }
            Strategy::LatestByFinalizedBlock => {
                let result = self
                    .call("eth_getBlockByNumber", vec![json!("finalized"), json!(false)])
                    .await?;
                let hex = result.get("number").and_then(Value::as_str).ok_or_else(|| {
                    SyncError::Protocol(format!(
                        "eth_getBlockByNumber(finalized): missing block number in {}",
                        abbreviate(&result)
                    ))
                })?;
                parse_hex_u64(hex)
            }
        }
    }

    async fn fetch_logs(
        &self,
        address: &str,
        topic: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLogEntry>, SyncError> {
        let filter = json!({
            "address": address,
            "topics": [topic],
            "fromBlock": to_hex(from_block),
            "toBlock": to_hex(to_block),
        });
        let result = self.call("eth_getLogs", vec![filter]).await?;
        if result.is_null() {
            return Ok(vec![]);
        }
        serde_json::from_value(result)
            .map_err(|e| SyncError::Protocol(format!("eth_getLogs: malformed log entries: {e}")))
    }
}

fn abbreviate(v: &Value) -> String {
    let s = v.to_string();
    if s.len() > 120 {
        let cut = (0..=120).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
        format!("{}…", &s[..cut])
    } else {
        s
    }
}
