use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use poolwatch_core::{EventCatalog, SchedulerConfig};
use poolwatch_rpc::{HttpClientConfig, NetworkEndpoint, NetworkRegistry, RetryConfig};

/// Env var consulted for the shared RPC credential when the file sets none.
pub const API_KEY_ENV: &str = "POOLWATCH_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required env var: {0}")]
    MissingEnv(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Per-network endpoint overrides and additions, keyed by network id.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Extra event signatures: name → canonical signature.
    #[serde(default)]
    pub events: BTreeMap<String, String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetsConfig {
    /// CSV file with `chain,factory_address,exchange_name,event` columns.
    #[serde(default = "default_targets_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Delay between clean iterations, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Cap for the backoff delay after failed iterations, in seconds.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Random extra delay as a fraction of the base delay, between 0 and 1.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Most blocks spanned by one `eth_getLogs` call.
    #[serde(default = "default_max_block_range")]
    pub max_block_range: u64,
    #[serde(default = "default_max_concurrent_networks")]
    pub max_concurrent_networks: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retries for transient transport failures (not counting the first try).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Credential shared by the built-in networks.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Name of an env var holding the shared credential.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    /// Base URL; required for networks that are not built in.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_sink")]
    pub sink: Backend,
    #[serde(default = "default_cursors")]
    pub cursors: Backend,
    /// SQLite database file, shared by sink and cursors.
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// Optional log file, truncated at startup.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_targets_path() -> PathBuf {
    PathBuf::from("targets.csv")
}
fn default_interval_ms() -> u64 {
    2000
}
fn default_max_backoff_secs() -> u64 {
    60
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_jitter() -> f64 {
    0.1
}
fn default_max_block_range() -> u64 {
    2000
}
fn default_max_concurrent_networks() -> usize {
    1
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_sink() -> Backend {
    Backend::Sqlite
}
fn default_cursors() -> Backend {
    Backend::Memory
}
fn default_db_path() -> String {
    "poolwatch.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            path: default_targets_path(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
            max_block_range: default_max_block_range(),
            max_concurrent_networks: default_max_concurrent_networks(),
        }
    }
}

impl PollerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.jitter.is_finite() || !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::Invalid(format!(
                "poller.jitter must be between 0 and 1, got {}",
                self.jitter
            )));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "poller.backoff_multiplier must be a finite number >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            api_key: None,
            api_key_env: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            cursors: default_cursors(),
            path: default_db_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

/// Inline key wins over `env`; a named env var that is unset is an error.
fn resolve_credential(
    inline: &Option<String>,
    env: &Option<String>,
) -> Result<Option<String>, ConfigError> {
    if let Some(key) = inline {
        return Ok(Some(key.clone()));
    }
    match env {
        Some(var) => std::env::var(var)
            .map(Some)
            .map_err(|_| ConfigError::MissingEnv(var.clone())),
        None => Ok(None),
    }
}

impl Config {
    /// Load config from a TOML file, then overlay the shared credential from
    /// `POOLWATCH_API_KEY` if the file sets none.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        if config.rpc.api_key.is_none() && config.rpc.api_key_env.is_none() {
            config.rpc.api_key = std::env::var(API_KEY_ENV).ok();
        }
        config.poller.validate()?;
        Ok(config)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_millis(self.poller.interval_ms),
            max_backoff: Duration::from_secs(self.poller.max_backoff_secs),
            multiplier: self.poller.backoff_multiplier,
            jitter_fraction: self.poller.jitter,
        }
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            retry: RetryConfig {
                max_retries: self.rpc.max_retries,
                ..RetryConfig::default()
            },
            request_timeout: Duration::from_secs(self.rpc.request_timeout_secs),
        }
    }

    /// Built-in networks with the shared credential, then the `[networks]`
    /// overrides on top.
    pub fn network_registry(&self) -> Result<NetworkRegistry, ConfigError> {
        let shared = resolve_credential(&self.rpc.api_key, &self.rpc.api_key_env)?;
        let mut registry = NetworkRegistry::builtin(shared.clone());

        for (id, net) in &self.networks {
            let own = resolve_credential(&net.api_key, &net.api_key_env)?;
            let endpoint = match (&net.url, registry.endpoint(id)) {
                (Some(url), _) => NetworkEndpoint::new(url.clone(), own),
                (None, Ok(builtin)) => {
                    NetworkEndpoint::new(builtin.base_url.clone(), own.or_else(|| shared.clone()))
                }
                (None, Err(_)) => {
                    return Err(ConfigError::Invalid(format!(
                        "network '{id}' is not built in and has no url"
                    )))
                }
            };
            registry.insert(id.clone(), endpoint);
        }
        Ok(registry)
    }

    /// The built-in catalog plus `[events]`.
    pub fn catalog(&self) -> EventCatalog {
        self.events
            .iter()
            .fold(EventCatalog::builtin(), |catalog, (name, signature)| {
                catalog.with_signature(name.clone(), signature.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[targets]
path = "factories.csv"

[poller]
interval_ms = 5000
max_block_range = 500
max_concurrent_networks = 3

[rpc]
api_key = "shared-key"
request_timeout_secs = 10

[networks.ethereum]
url = "http://localhost:8545"

[networks.base]
api_key = "base-key"

[networks.sonic]
url = "https://rpc.soniclabs.com"

[events]
PoolCreatedAlgebra = "Pool(address,address,address)"

[storage]
sink = "sqlite"
cursors = "sqlite"
path = "/var/lib/poolwatch/pools.db"

[logging]
level = "debug"
json = true
file = "poolwatch.log"
"#;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.targets.path, PathBuf::from("targets.csv"));
        assert_eq!(config.poller.interval_ms, 2000);
        assert_eq!(config.poller.max_block_range, 2000);
        assert_eq!(config.poller.max_concurrent_networks, 1);
        assert_eq!(config.rpc.request_timeout_secs, 30);
        assert_eq!(config.storage.sink, Backend::Sqlite);
        assert_eq!(config.storage.cursors, Backend::Memory);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn parses_full_sample() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.targets.path, PathBuf::from("factories.csv"));
        assert_eq!(config.scheduler_config().interval, Duration::from_secs(5));
        assert_eq!(config.http_config().request_timeout, Duration::from_secs(10));
        assert_eq!(config.storage.cursors, Backend::Sqlite);
        assert!(config.logging.json);
        assert_eq!(config.logging.file, Some(PathBuf::from("poolwatch.log")));
    }

    #[test]
    fn registry_applies_overrides() {
        let registry = Config::parse(SAMPLE).unwrap().network_registry().unwrap();

        // Explicit url, no credential: a local node.
        assert_eq!(registry.endpoint("ethereum").unwrap().url(), "http://localhost:8545");
        // Built-in url, own credential.
        assert_eq!(
            registry.endpoint("base").unwrap().url(),
            "https://base-mainnet.g.alchemy.com/v2/base-key"
        );
        // Untouched built-in keeps the shared credential.
        assert!(registry.endpoint("arbitrum").unwrap().url().ends_with("/shared-key"));
        // New network.
        assert!(registry.contains("sonic"));
    }

    #[test]
    fn credential_from_named_env_var() {
        std::env::set_var("POOLWATCH_TEST_OPTIMISM_KEY", "from-env");
        let config = Config::parse(
            r#"
[networks.optimism]
api_key_env = "POOLWATCH_TEST_OPTIMISM_KEY"
"#,
        )
        .unwrap();
        let registry = config.network_registry().unwrap();
        assert!(registry.endpoint("optimism").unwrap().url().ends_with("/from-env"));
    }

    #[test]
    fn missing_named_env_var_is_an_error() {
        let config = Config::parse(
            r#"
[rpc]
api_key_env = "POOLWATCH_TEST_DEFINITELY_UNSET"
"#,
        )
        .unwrap();
        let err = config.network_registry().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(var) if var == "POOLWATCH_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn unknown_network_needs_a_url() {
        let config = Config::parse("[networks.fantom]\napi_key = \"k\"\n").unwrap();
        assert!(matches!(config.network_registry(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn extra_events_extend_the_catalog() {
        let catalog = Config::parse(SAMPLE).unwrap().catalog();
        assert!(catalog.topic_for("PairCreated").is_ok());
        assert!(catalog.topic_for("PoolCreatedAlgebra").is_ok());
        assert_eq!(
            catalog.signature_for("PoolCreatedAlgebra"),
            Some("Pool(address,address,address)")
        );
    }

    #[test]
    fn jitter_out_of_range_is_rejected() {
        for value in ["nan", "inf", "-0.1", "1.5"] {
            let err = Config::parse(&format!("[poller]\njitter = {value}\n")).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid(ref msg) if msg.contains("poller.jitter")),
                "jitter = {value}: {err}"
            );
        }
        assert!(Config::parse("[poller]\njitter = 0.0\n").is_ok());
        assert!(Config::parse("[poller]\njitter = 1.0\n").is_ok());
    }

    #[test]
    fn backoff_multiplier_out_of_range_is_rejected() {
        for value in ["nan", "-inf", "0.5"] {
            let err =
                Config::parse(&format!("[poller]\nbackoff_multiplier = {value}\n")).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid(ref msg) if msg.contains("backoff_multiplier")),
                "backoff_multiplier = {value}: {err}"
            );
        }
        assert!(Config::parse("[poller]\nbackoff_multiplier = 1.0\n").is_ok());
    }

    #[test]
    fn bad_backend_is_a_parse_error() {
        let err = Config::parse("[storage]\nsink = \"postgres\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poolwatch.toml");
        std::fs::write(&path, "[poller]\ninterval_ms = 250\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().poller.interval_ms, 250);
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
