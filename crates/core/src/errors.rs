//! Error types

use std::time::Duration;
use thiserror::Error;

/// Failure of a single source fetch. Always recovered by dropping the source
/// from the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Instrument {0} not listed")]
    Unsupported(String),

    #[error("Venue error: {0}")]
    Venue(String),
}

/// Failure of a whole scan cycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("No source returned market data for any of {instruments} instruments")]
    NoMarketData { instruments: usize },

    #[error("All {protocols} yield protocols failed")]
    NoYieldData { protocols: usize },
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No instruments configured")]
    NoInstruments,

    #[error("No price sources configured")]
    NoSources,

    #[error("No yield protocols configured")]
    NoProtocols,

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid instrument {0:?}, expected BASE/QUOTE")]
    InvalidInstrument(String),

    #[error("Invalid configuration: {0}")]
    InvalidValue(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Result type alias
pub type FetchResult<T> = Result<T, FetchError>;
pub type ScanResult<T> = Result<T, ScanError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
