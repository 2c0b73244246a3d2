//! Source traits, shared HTTP plumbing and the source registry

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use arb_core::{ConfigError, ConfigResult, FetchError, FetchResult, Instrument, Ticker, YieldOffer};

use crate::exchanges::{BinanceSource, CoinbaseSource, KrakenSource};
use crate::protocols::{AaveSource, CompoundSource};

const USER_AGENT: &str = concat!("arb-agent/", env!("CARGO_PKG_VERSION"));

/// A venue able to report the current ticker for an instrument
#[async_trait]
pub trait TickerSource: Send + Sync {
    fn id(&self) -> &str;
    async fn fetch_ticker(&self, instrument: &Instrument) -> FetchResult<Ticker>;
}

/// A protocol able to report its current yield offers
#[async_trait]
pub trait YieldSource: Send + Sync {
    fn protocol(&self) -> &str;
    async fn fetch_offers(&self) -> FetchResult<Vec<YieldOffer>>;
}

/// Shared HTTP client for all REST sources
pub fn http_client(timeout: Duration) -> ConfigResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ConfigError::InvalidValue(format!("failed to build HTTP client: {e}")))
}

/// GET `url` and decode the body as JSON
pub(crate) async fn get_json(client: &Client, url: &str, query: &[(&str, &str)]) -> FetchResult<Value> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| FetchError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        debug!(%url, status = status.as_u16(), "non-success status");
        return Err(FetchError::Status(status.as_u16()));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Decimal from a JSON number or numeric string. Empty strings, nulls and
/// garbage yield `None`.
pub(crate) fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if text.is_empty() {
        return None;
    }

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Resolve configured venue names, preserving their order
pub fn build_ticker_sources(names: &[String], client: &Client) -> ConfigResult<Vec<Arc<dyn TickerSource>>> {
    ensure_unique(names)?;

    names
        .iter()
        .map(|name| -> ConfigResult<Arc<dyn TickerSource>> {
            match name.to_lowercase().as_str() {
                "binance" => Ok(Arc::new(BinanceSource::new(client.clone()))),
                "kraken" => Ok(Arc::new(KrakenSource::new(client.clone()))),
                "coinbase" => Ok(Arc::new(CoinbaseSource::new(client.clone()))),
                _ => Err(ConfigError::UnknownSource(name.clone())),
            }
        })
        .collect()
}

/// Resolve configured protocol names, preserving their order
pub fn build_yield_sources(
    names: &[String],
    client: &Client,
    per_protocol_limit: usize,
) -> ConfigResult<Vec<Arc<dyn YieldSource>>> {
    ensure_unique(names)?;

    names
        .iter()
        .map(|name| -> ConfigResult<Arc<dyn YieldSource>> {
            match name.to_lowercase().as_str() {
                "aave" => Ok(Arc::new(AaveSource::new(client.clone(), per_protocol_limit))),
                "compound" => Ok(Arc::new(CompoundSource::new(client.clone(), per_protocol_limit))),
                _ => Err(ConfigError::UnknownSource(name.clone())),
            }
        })
        .collect()
}

fn ensure_unique(names: &[String]) -> ConfigResult<()> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].iter().any(|n| n.eq_ignore_ascii_case(name)) {
            return Err(ConfigError::InvalidValue(format!("source {name} listed twice")));
        }
    }
    Ok(())
}
