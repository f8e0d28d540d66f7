//! EVM log fetching: the `ChainClient` seam, the raw `eth_getLogs` entry and
//! its normalization into a `LogRecord`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use poolwatch_core::{LogRecord, Strategy, SyncError, Target};

/// A raw EVM log as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogEntry {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "blockHash")]
    pub block_hash: String,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "transactionIndex")]
    pub transaction_index: String,
    #[serde(rename = "logIndex")]
    pub log_index: String,
    #[serde(default)]
    pub removed: bool,
}

impl RawLogEntry {
    /// Normalize into a `LogRecord` for `target` under `strategy`.
    ///
    /// Pure: the result depends only on the inputs. Fails with `Protocol` if a
    /// hex field does not decode.
    pub fn to_record(&self, target: &Target, strategy: Strategy) -> Result<LogRecord, SyncError> {
        Ok(LogRecord {
            transaction_index: parse_hex_u64(&self.transaction_index)?,
            transaction_hash: self.transaction_hash.clone(),
            log_index: parse_hex_u64(&self.log_index)?,
            removed: self.removed,
            block_number: parse_hex_u64(&self.block_number)?,
            block_hash: self.block_hash.clone(),
            exchange_label: target.exchange_label.clone(),
            network: target.network.clone(),
            strategy,
        })
    }
}

/// JSON-RPC access to one network.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Latest known block under `strategy`.
    async fn current_block(&self, strategy: Strategy) -> Result<u64, SyncError>;

    /// Logs emitted by `address` with topic0 `topic` in `[from_block, to_block]`
    /// (both inclusive). No matches is `Ok(vec![])`.
    async fn fetch_logs(
        &self,
        address: &str,
        topic: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLogEntry>, SyncError>;
}

/// Wraps a `ChainClient` and splits large ranges into bounded chunks.
pub struct LogFetcher<'a> {
    client: &'a dyn ChainClient,
    max_range: u64,
}

impl<'a> LogFetcher<'a> {
    /// `max_range` is the most blocks a single `eth_getLogs` call may span.
    pub fn new(client: &'a dyn ChainClient, max_range: u64) -> Self {
        Self {
            client,
            max_range: max_range.max(1),
        }
    }

    /// Fetch all logs in `[from, to]`, chunk by chunk in ascending order.
    /// A reversed range yields nothing and never reaches the client.
    pub async fn logs(
        &self,
        address: &str,
        topic: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLogEntry>, SyncError> {
        if to < from {
            return Ok(vec![]);
        }
        let mut all_logs = Vec::new();
        let mut start = from;
        loop {
            let end = start.saturating_add(self.max_range - 1).min(to);
            let chunk = self.client.fetch_logs(address, topic, start, end).await?;
            all_logs.extend(chunk);
            if end >= to {
                break;
            }
            start = end + 1;
        }
        Ok(all_logs)
    }
}

/// Parse a `0x`-prefixed hex quantity to u64.
pub fn parse_hex_u64(s: &str) -> Result<u64, SyncError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| SyncError::Protocol(format!("expected 0x-prefixed hex, got '{s}'")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| SyncError::Protocol(format!("invalid hex quantity '{s}': {e}")))
}

/// Format a block number as a `0x`-prefixed hex quantity.
pub fn to_hex(n: u64) -> String {
    format!("0x{n:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn raw(block: &str) -> RawLogEntry {
        RawLogEntry {
            address: "0x5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f".into(),
            topics: vec![],
            data: "0x".into(),
            block_number: block.into(),
            block_hash: "0xbeef".into(),
            transaction_hash: "0xfeed".into(),
            transaction_index: "0x3".into(),
            log_index: "0x1a".into(),
            removed: false,
        }
    }

    #[test]
    fn parse_hex_quantities() {
        assert_eq!(parse_hex_u64("0x0").unwrap(), 0);
        assert_eq!(parse_hex_u64("0x64").unwrap(), 100);
        assert_eq!(parse_hex_u64("0x12a05f200").unwrap(), 5_000_000_000);
        assert!(matches!(parse_hex_u64("64"), Err(SyncError::Protocol(_))));
        assert!(matches!(parse_hex_u64("0xzz"), Err(SyncError::Protocol(_))));
        assert!(matches!(parse_hex_u64("0x"), Err(SyncError::Protocol(_))));
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(to_hex(0), "0x0");
        assert_eq!(to_hex(100), "0x64");
    }

    #[test]
    fn raw_entry_deserializes_from_rpc_shape() {
        let json = r#"{
            "address": "0x1f98431c8ad98523631ae4a59f267346ea31f984",
            "topics": ["0x783cca1c0412dd0d695e784568c96da2e9c22ff989357a2e8b1d9b2b4e6b7118"],
            "data": "0x000000",
            "blockNumber": "0x1312d00",
            "blockHash": "0xabc",
            "transactionHash": "0xdef",
            "transactionIndex": "0x0",
            "logIndex": "0x2",
            "removed": false
        }"#;
        let entry: RawLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.block_number, "0x1312d00");
        assert_eq!(entry.topics.len(), 1);
    }

    #[test]
    fn normalization_decodes_and_passes_through() {
        let target = Target::new("ethereum", "0xABC", "uniswap_v2", "PairCreated");
        let mut entry = raw("0x64");
        entry.removed = true;

        let record = entry.to_record(&target, Strategy::LatestByNumber).unwrap();
        assert_eq!(record.block_number, 100);
        assert_eq!(record.transaction_index, 3);
        assert_eq!(record.log_index, 26);
        assert!(record.removed);
        assert_eq!(record.block_hash, "0xbeef");
        assert_eq!(record.transaction_hash, "0xfeed");
        assert_eq!(record.exchange_label, "uniswap_v2");
        assert_eq!(record.network, "ethereum");
        assert_eq!(record.strategy, Strategy::LatestByNumber);

        // Deterministic.
        assert_eq!(entry.to_record(&target, Strategy::LatestByNumber).unwrap(), record);
    }

    #[test]
    fn normalization_rejects_bad_hex() {
        let target = Target::new("ethereum", "0xABC", "uniswap_v2", "PairCreated");
        let err = raw("100").to_record(&target, Strategy::LatestByNumber).unwrap_err();
        assert!(matches!(err, SyncError::Protocol(_)));
    }

    /// Records the ranges it is asked for; returns one log per call.
    #[derive(Default)]
    struct RangeRecorder {
        calls: Mutex<Vec<(u64, u64)>>,
    }

    #[async_trait]
    impl ChainClient for RangeRecorder {
        async fn current_block(&self, _strategy: Strategy) -> Result<u64, SyncError> {
            Ok(0)
        }

        async fn fetch_logs(
            &self,
            _address: &str,
            _topic: &str,
            from_block: u64,
            to_block: u64,
        ) -> Result<Vec<RawLogEntry>, SyncError> {
            self.calls.lock().unwrap().push((from_block, to_block));
            Ok(vec![raw(&to_hex(from_block))])
        }
    }

    #[tokio::test]
    async fn chunks_cover_range_exactly_once() {
        let client = RangeRecorder::default();
        let logs = LogFetcher::new(&client, 10).logs("0x1", "0x2", 100, 125).await.unwrap();

        let calls = client.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(100, 109), (110, 119), (120, 125)]);
        assert_eq!(logs.len(), 3);
    }

    #[tokio::test]
    async fn single_block_range_is_one_call() {
        let client = RangeRecorder::default();
        LogFetcher::new(&client, 1000).logs("0x1", "0x2", 100, 100).await.unwrap();
        assert_eq!(client.calls.lock().unwrap().clone(), vec![(100, 100)]);
    }

    #[tokio::test]
    async fn reversed_range_skips_client() {
        let client = RangeRecorder::default();
        let logs = LogFetcher::new(&client, 1000).logs("0x1", "0x2", 101, 100).await.unwrap();
        assert!(logs.is_empty());
        assert!(client.calls.lock().unwrap().is_empty());
    }
}
