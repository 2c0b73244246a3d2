//! REST yield sources for lending protocols

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use arb_core::{FetchError, FetchResult, OfferType, YieldOffer};

use crate::feeds::{decimal_from_json, get_json, YieldSource};

const AAVE_API: &str = "https://aave-api-v2.aave.com/data/liquidity/v2";
const COMPOUND_API: &str = "https://api.compound.finance/api/v2/ctoken";

/// Aave v2 liquidity reserves
pub struct AaveSource {
    client: Client,
    url: String,
    limit: usize,
}

impl AaveSource {
    pub fn new(client: Client, limit: usize) -> Self {
        Self {
            client,
            url: AAVE_API.to_string(),
            limit,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl YieldSource for AaveSource {
    fn protocol(&self) -> &str {
        "Aave"
    }

    async fn fetch_offers(&self) -> FetchResult<Vec<YieldOffer>> {
        let body = get_json(&self.client, &self.url, &[]).await?;
        parse_aave_reserves(&body, self.limit)
    }
}

/// First `limit` entries of `reserves[]`, `liquidityRate` is a per-unit rate
pub fn parse_aave_reserves(body: &Value, limit: usize) -> FetchResult<Vec<YieldOffer>> {
    let reserves = body
        .get("reserves")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Malformed("missing reserves".to_string()))?;

    Ok(reserves
        .iter()
        .take(limit)
        .map(|reserve| {
            YieldOffer::from_rate(
                "Aave",
                reserve.get("symbol").and_then(Value::as_str).unwrap_or("Unknown"),
                reserve.get("liquidityRate").and_then(decimal_from_json),
                OfferType::Lending,
            )
        })
        .collect())
}

/// Compound v2 cToken markets
pub struct CompoundSource {
    client: Client,
    url: String,
    limit: usize,
}

impl CompoundSource {
    pub fn new(client: Client, limit: usize) -> Self {
        Self {
            client,
            url: COMPOUND_API.to_string(),
            limit,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl YieldSource for CompoundSource {
    fn protocol(&self) -> &str {
        "Compound"
    }

    async fn fetch_offers(&self) -> FetchResult<Vec<YieldOffer>> {
        let body = get_json(&self.client, &self.url, &[]).await?;
        parse_compound_ctokens(&body, self.limit)
    }
}

/// First `limit` entries of `cToken[]`, rate under `supply_rate.value`
pub fn parse_compound_ctokens(body: &Value, limit: usize) -> FetchResult<Vec<YieldOffer>> {
    let tokens = body
        .get("cToken")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Malformed("missing cToken".to_string()))?;

    Ok(tokens
        .iter()
        .take(limit)
        .map(|token| {
            YieldOffer::from_rate(
                "Compound",
                token.get("underlying_symbol").and_then(Value::as_str).unwrap_or("Unknown"),
                token
                    .get("supply_rate")
                    .and_then(|rate| rate.get("value"))
                    .and_then(decimal_from_json),
                OfferType::Lending,
            )
        })
        .collect())
}
