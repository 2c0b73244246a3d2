//! Configuration types
//!
//! `AgentConfig` is read from an optional TOML file layered under
//! `ARB_AGENT__*` environment variables (`__` separates nesting levels, lists
//! are comma separated). Every field has a default.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::{ConfigError, ConfigResult, Instrument};

pub const ENV_PREFIX: &str = "ARB_AGENT";

const LIST_KEYS: [&str; 3] = [
    "arbitrage.instruments",
    "arbitrage.sources",
    "yield_scan.protocols",
];

/// Which directions of a source pair are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairScan {
    /// Only buy at the earlier source and sell at the later one
    ForwardOnly,
    /// Check both directions of every pair
    #[default]
    Bidirectional,
}

/// Cross-venue arbitrage scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrageConfig {
    pub enabled: bool,
    pub instruments: Vec<Instrument>,
    pub sources: Vec<String>,
    pub min_profit_pct: Decimal,
    pub pair_scan: PairScan,
    pub scan_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub fetch_timeout_ms: u64,
    pub parallel_instruments: bool,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            instruments: vec![
                Instrument::new("BTC", "USDT"),
                Instrument::new("ETH", "USDT"),
            ],
            sources: vec![
                "binance".to_string(),
                "coinbase".to_string(),
                "kraken".to_string(),
            ],
            min_profit_pct: Decimal::new(5, 1),  // 0.5%
            pair_scan: PairScan::Bidirectional,
            scan_interval_secs: 30,
            error_backoff_secs: 60,
            fetch_timeout_ms: 10_000,
            parallel_instruments: false,
        }
    }
}

impl ArbitrageConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if self.min_profit_pct.is_sign_negative() {
            return Err(ConfigError::InvalidValue(format!(
                "arbitrage.min_profit_pct must not be negative, got {}",
                self.min_profit_pct
            )));
        }
        check_durations("arbitrage", self.scan_interval_secs, self.error_backoff_secs, self.fetch_timeout_ms)
    }
}

/// DeFi yield scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldScanConfig {
    pub enabled: bool,
    pub protocols: Vec<String>,
    pub top_k: usize,
    pub per_protocol_limit: usize,
    pub scan_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub fetch_timeout_ms: u64,
}

impl Default for YieldScanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            protocols: vec!["aave".to_string(), "compound".to_string()],
            top_k: 10,
            per_protocol_limit: 5,
            scan_interval_secs: 300,
            error_backoff_secs: 60,
            fetch_timeout_ms: 10_000,
        }
    }
}

impl YieldScanConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.protocols.is_empty() {
            return Err(ConfigError::NoProtocols);
        }
        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue("yield_scan.top_k must be positive".to_string()));
        }
        if self.per_protocol_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "yield_scan.per_protocol_limit must be positive".to_string(),
            ));
        }
        check_durations("yield_scan", self.scan_interval_secs, self.error_backoff_secs, self.fetch_timeout_ms)
    }
}

fn check_durations(section: &str, interval_secs: u64, backoff_secs: u64, timeout_ms: u64) -> ConfigResult<()> {
    for (name, value) in [
        ("scan_interval_secs", interval_secs),
        ("error_backoff_secs", backoff_secs),
        ("fetch_timeout_ms", timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidValue(format!("{section}.{name} must be positive")));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub agent_id: String,
    pub arbitrage: ArbitrageConfig,
    pub yield_scan: YieldScanConfig,
    pub logging: LoggingConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: "arbitrage-001".to_string(),
            arbitrage: ArbitrageConfig::default(),
            yield_scan: YieldScanConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load from `path` (if it exists) and the process environment, then validate
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(environment(None))
            .build()?
            .try_deserialize::<Self>()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document layered under an explicit environment map
    pub fn from_toml_str(toml: &str, env: Option<HashMap<String, String>>) -> ConfigResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .add_source(environment(env))
            .build()?
            .try_deserialize::<Self>()?;

        config.validate()?;
        Ok(config)
    }

    /// Refuse configurations that would loop forever producing nothing
    pub fn validate(&self) -> ConfigResult<()> {
        if self.agent_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("agent_id must not be empty".to_string()));
        }
        if self.arbitrage.enabled {
            self.arbitrage.validate()?;
        }
        if self.yield_scan.enabled {
            self.yield_scan.validate()?;
        }
        if !self.arbitrage.enabled && !self.yield_scan.enabled {
            return Err(ConfigError::InvalidValue("no scanner enabled".to_string()));
        }
        Ok(())
    }
}

fn environment(source: Option<HashMap<String, String>>) -> config::Environment {
    LIST_KEYS.iter().fold(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .try_parsing(true)
            .source(source),
        |env, key| env.with_list_parse_key(key),
    )
}
