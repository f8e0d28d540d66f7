//! CSV target list loader.
//!
//! Expected header (extra columns are ignored, order is free):
//!
//! ```text
//! chain,factory_address,exchange_name,event
//! ethereum,0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f,uniswap_v2,PairCreated
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use poolwatch_core::{SyncError, Target, TargetLoader};

/// Columns every target file must have.
pub const REQUIRED_COLUMNS: [&str; 4] = ["chain", "factory_address", "exchange_name", "event"];

#[derive(Debug, Deserialize)]
struct TargetRow {
    chain: String,
    factory_address: String,
    exchange_name: String,
    event: String,
}

/// Loads targets from a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvTargetLoader {
    path: PathBuf,
}

impl CsvTargetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse targets from any reader (file contents, test fixtures, ...).
    pub fn parse<R: Read>(reader: R) -> Result<Vec<Target>, SyncError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| SyncError::Loader(format!("cannot read header: {e}")))?
            .clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::Loader(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }

        let mut targets = Vec::new();
        for (idx, row) in rdr.deserialize::<TargetRow>().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let row = row.map_err(|e| SyncError::Loader(format!("line {line}: {e}")))?;
            if row.chain.is_empty()
                && row.factory_address.is_empty()
                && row.exchange_name.is_empty()
                && row.event.is_empty()
            {
                continue;
            }
            for (column, value) in [
                ("chain", &row.chain),
                ("factory_address", &row.factory_address),
                ("event", &row.event),
            ] {
                if value.is_empty() {
                    return Err(SyncError::Loader(format!("line {line}: empty '{column}'")));
                }
            }
            targets.push(Target::new(
                row.chain,
                row.factory_address,
                row.exchange_name,
                row.event,
            ));
        }
        Ok(targets)
    }
}

impl TargetLoader for CsvTargetLoader {
    fn load(&self) -> Result<Vec<Target>, SyncError> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| SyncError::Loader(format!("{}: {e}", self.path.display())))?;
        let targets = Self::parse(file)?;
        info!(path = %self.path.display(), targets = targets.len(), "targets loaded");
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_rows_and_ignores_extra_columns() {
        let csv = "\
id,chain,factory_address,exchange_name,event,notes
1,ethereum,0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f,uniswap_v2,PairCreated,classic
2, base ,0x33128a8fC17869897dcE68Ed026d694621f6FDfD,uniswap_v3,PoolCreated,
";
        let targets = CsvTargetLoader::parse(csv.as_bytes()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(
            targets[0],
            Target::new(
                "ethereum",
                "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f",
                "uniswap_v2",
                "PairCreated"
            )
        );
        // Whitespace trimmed.
        assert_eq!(targets[1].network, "base");
        assert_eq!(targets[1].event_name, "PoolCreated");
    }

    #[test]
    fn missing_column_is_loader_error() {
        let csv = "chain,factory_address,event\nethereum,0x1,PairCreated\n";
        let err = CsvTargetLoader::parse(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SyncError::Loader(msg) if msg.contains("exchange_name")));
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let csv = "chain,factory_address,exchange_name,event\nethereum,,uniswap_v2,PairCreated\n";
        let err = CsvTargetLoader::parse(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SyncError::Loader(msg) if msg.contains("line 2")));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let csv = "chain,factory_address,exchange_name,event\n,,,\nethereum,0x1,sushi,PairCreated\n";
        let targets = CsvTargetLoader::parse(csv.as_bytes()).unwrap();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chain,factory_address,exchange_name,event").unwrap();
        writeln!(file, "arbitrum,0xf1D7CC64Fb4452F05c498126312eBE29f30Fbcf9,uniswap_v2,PairCreated").unwrap();

        let targets = CsvTargetLoader::new(file.path()).load().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].network, "arbitrum");
    }

    #[test]
    fn missing_file_is_loader_error() {
        let err = CsvTargetLoader::new("/nonexistent/targets.csv").load().unwrap_err();
        assert!(matches!(err, SyncError::Loader(_)));
    }
}
