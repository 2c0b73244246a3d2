//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// A traded pair such as `BTC/USDT`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument {
    base: String,
    quote: String,
}

impl Instrument {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Venue symbol with the two legs joined by `sep` (`BTCUSDT`, `BTC-USDT`)
    pub fn joined(&self, sep: &str) -> String {
        format!("{}{}{}", self.base, sep, self.quote)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Instrument {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidInstrument(s.to_string()))?;

        let (base, quote) = (base.trim(), quote.trim());
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return Err(ConfigError::InvalidInstrument(s.to_string()));
        }

        Ok(Self::new(base, quote))
    }
}

impl TryFrom<String> for Instrument {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Instrument> for String {
    fn from(value: Instrument) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_parsing() {
        let btc: Instrument = "btc/usdt".parse().unwrap();
        assert_eq!(btc.base(), "BTC");
        assert_eq!(btc.quote(), "USDT");
        assert_eq!(btc.to_string(), "BTC/USDT");
        assert_eq!(btc.joined(""), "BTCUSDT");
        assert_eq!(btc.joined("-"), "BTC-USDT");
    }

    #[test]
    fn test_invalid_instruments() {
        for raw in ["BTCUSDT", "/USDT", "BTC/", "A/B/C", ""] {
            assert!(raw.parse::<Instrument>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_instrument_serde() {
        let eth = Instrument::new("eth", "usdt");
        let json = serde_json::to_string(&eth).unwrap();
        assert_eq!(json, "\"ETH/USDT\"");

        let back: Instrument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, eth);
        assert!(serde_json::from_str::<Instrument>("\"ETHUSDT\"").is_err());
    }
}
