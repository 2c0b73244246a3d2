//! REST ticker sources for centralized exchanges
//!
//! Each venue has its own symbol convention and response layout; parsing is
//! kept in free functions so it can be tested against captured payloads.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use arb_core::{FetchError, FetchResult, Instrument, Ticker};

use crate::feeds::{decimal_from_json, get_json, TickerSource};

const BINANCE_API: &str = "https://api.binance.com";
const KRAKEN_API: &str = "https://api.kraken.com";
const COINBASE_API: &str = "https://api.exchange.coinbase.com";

/// Binance spot, 24h ticker endpoint
pub struct BinanceSource {
    client: Client,
    base_url: String,
}

impl BinanceSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BINANCE_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn symbol(instrument: &Instrument) -> String {
        instrument.joined("")
    }
}

#[async_trait]
impl TickerSource for BinanceSource {
    fn id(&self) -> &str {
        "binance"
    }

    async fn fetch_ticker(&self, instrument: &Instrument) -> FetchResult<Ticker> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        let symbol = Self::symbol(instrument);

        match get_json(&self.client, &url, &[("symbol", symbol.as_str())]).await {
            // Binance answers 400 with code -1121 for unknown symbols
            Err(FetchError::Status(400)) => Err(FetchError::Unsupported(instrument.to_string())),
            other => parse_binance_ticker(&other?),
        }
    }
}

pub fn parse_binance_ticker(body: &Value) -> FetchResult<Ticker> {
    if let Some(msg) = body.get("msg").and_then(Value::as_str) {
        return Err(FetchError::Venue(msg.to_string()));
    }

    Ok(Ticker {
        bid: body.get("bidPrice").and_then(decimal_from_json),
        ask: body.get("askPrice").and_then(decimal_from_json),
        last: body.get("lastPrice").and_then(decimal_from_json),
    })
}

/// Kraken public ticker endpoint
pub struct KrakenSource {
    client: Client,
    base_url: String,
}

impl KrakenSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: KRAKEN_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Kraken still lists bitcoin as XBT
    pub fn symbol(instrument: &Instrument) -> String {
        let kraken_asset = |asset: &str| match asset {
            "BTC" => "XBT".to_string(),
            other => other.to_string(),
        };
        format!("{}{}", kraken_asset(instrument.base()), kraken_asset(instrument.quote()))
    }
}

#[async_trait]
impl TickerSource for KrakenSource {
    fn id(&self) -> &str {
        "kraken"
    }

    async fn fetch_ticker(&self, instrument: &Instrument) -> FetchResult<Ticker> {
        let url = format!("{}/0/public/Ticker", self.base_url);
        let pair = Self::symbol(instrument);
        let body = get_json(&self.client, &url, &[("pair", pair.as_str())]).await?;

        parse_kraken_ticker(&body).map_err(|e| match e {
            FetchError::Venue(msg) if msg.contains("Unknown asset pair") => {
                FetchError::Unsupported(instrument.to_string())
            }
            other => other,
        })
    }
}

/// `{"error": [], "result": {"XBTUSDT": {"a": ["price", ..], "b": [..], "c": [..]}}}`
///
/// The result key is Kraken's canonical pair name, which may differ from the
/// requested one, so the first entry is used.
pub fn parse_kraken_ticker(body: &Value) -> FetchResult<Ticker> {
    if let Some(errors) = body.get("error").and_then(Value::as_array) {
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(FetchError::Venue(joined));
        }
    }

    let entry = body
        .get("result")
        .and_then(Value::as_object)
        .and_then(|result| result.values().next())
        .ok_or_else(|| FetchError::Malformed("missing result".to_string()))?;

    let first = |field: &str| entry.get(field).and_then(|v| v.get(0)).and_then(decimal_from_json);

    Ok(Ticker {
        bid: first("b"),
        ask: first("a"),
        last: first("c"),
    })
}

/// Coinbase Exchange product ticker
pub struct CoinbaseSource {
    client: Client,
    base_url: String,
}

impl CoinbaseSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: COINBASE_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn symbol(instrument: &Instrument) -> String {
        instrument.joined("-")
    }
}

#[async_trait]
impl TickerSource for CoinbaseSource {
    fn id(&self) -> &str {
        "coinbase"
    }

    async fn fetch_ticker(&self, instrument: &Instrument) -> FetchResult<Ticker> {
        let url = format!("{}/products/{}/ticker", self.base_url, Self::symbol(instrument));

        match get_json(&self.client, &url, &[]).await {
            Err(FetchError::Status(404)) => Err(FetchError::Unsupported(instrument.to_string())),
            other => parse_coinbase_ticker(&other?),
        }
    }
}

pub fn parse_coinbase_ticker(body: &Value) -> FetchResult<Ticker> {
    if let Some(msg) = body.get("message").and_then(Value::as_str) {
        return Err(FetchError::Venue(msg.to_string()));
    }

    Ok(Ticker {
        bid: body.get("bid").and_then(decimal_from_json),
        ask: body.get("ask").and_then(decimal_from_json),
        last: body.get("price").and_then(decimal_from_json),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::canned::CannedServer;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn btc() -> Instrument {
        Instrument::new("BTC", "USDT")
    }

    #[test]
    fn test_symbols() {
        assert_eq!(BinanceSource::symbol(&btc()), "BTCUSDT");
        assert_eq!(KrakenSource::symbol(&btc()), "XBTUSDT");
        assert_eq!(KrakenSource::symbol(&Instrument::new("ETH", "USDT")), "ETHUSDT");
        assert_eq!(CoinbaseSource::symbol(&btc()), "BTC-USDT");
    }

    #[test]
    fn test_parse_binance() {
        let body = json!({
            "symbol": "BTCUSDT",
            "bidPrice": "64210.01000000",
            "askPrice": "64210.02000000",
            "lastPrice": "64210.01000000",
            "volume": "18234.1"
        });

        let ticker = parse_binance_ticker(&body).unwrap();
        assert_eq!(ticker.bid, Some(dec!(64210.01)));
        assert_eq!(ticker.ask, Some(dec!(64210.02)));
        assert_eq!(ticker.last, Some(dec!(64210.01)));

        let err = parse_binance_ticker(&json!({"code": -1121, "msg": "Invalid symbol."}));
        assert!(matches!(err, Err(FetchError::Venue(_))));
    }

    #[test]
    fn test_parse_kraken() {
        let body = json!({
            "error": [],
            "result": {
                "XBTUSDT": {
                    "a": ["64215.10000", "1", "1.000"],
                    "b": ["64215.00000", "2", "2.000"],
                    "c": ["64215.10000", "0.0012"]
                }
            }
        });

        let ticker = parse_kraken_ticker(&body).unwrap();
        assert_eq!(ticker.ask, Some(dec!(64215.1)));
        assert_eq!(ticker.bid, Some(dec!(64215)));
        assert_eq!(ticker.last, Some(dec!(64215.1)));

        let err = parse_kraken_ticker(&json!({"error": ["EQuery:Unknown asset pair"]}));
        assert!(matches!(err, Err(FetchError::Venue(msg)) if msg.contains("Unknown asset pair")));

        let err = parse_kraken_ticker(&json!({"error": []}));
        assert!(matches!(err, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_coinbase() {
        let body = json!({
            "ask": "64230.55",
            "bid": "64230.54",
            "price": "64230.54",
            "volume": "312.5"
        });

        let ticker = parse_coinbase_ticker(&body).unwrap();
        assert_eq!(ticker.ask, Some(dec!(64230.55)));
        assert_eq!(ticker.bid, Some(dec!(64230.54)));

        let err = parse_coinbase_ticker(&json!({"message": "NotFound"}));
        assert!(matches!(err, Err(FetchError::Venue(_))));
    }

    fn client() -> Client {
        crate::feeds::http_client(std::time::Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_binance_fetch() {
        let server = CannedServer::start(
            200,
            r#"{"symbol":"BTCUSDT","bidPrice":"99.90","askPrice":"100.00","lastPrice":"99.95"}"#,
        )
        .await;
        let source = BinanceSource::new(client()).with_base_url(&server.base_url);

        let ticker = source.fetch_ticker(&btc()).await.unwrap();
        assert_eq!(ticker, Ticker::new(dec!(99.9), dec!(100), dec!(99.95)));
        assert_eq!(server.request_lines(), vec!["GET /api/v3/ticker/24hr?symbol=BTCUSDT HTTP/1.1"]);
    }

    #[tokio::test]
    async fn test_binance_unknown_symbol_is_unsupported() {
        let server = CannedServer::start(400, r#"{"code":-1121,"msg":"Invalid symbol."}"#).await;
        let source = BinanceSource::new(client()).with_base_url(&server.base_url);

        let err = source.fetch_ticker(&btc()).await;
        assert_eq!(err, Err(FetchError::Unsupported("BTC/USDT".to_string())));

        let server = CannedServer::start(429, "{}").await;
        let source = BinanceSource::new(client()).with_base_url(&server.base_url);
        assert_eq!(source.fetch_ticker(&btc()).await, Err(FetchError::Status(429)));
    }

    #[tokio::test]
    async fn test_kraken_fetch() {
        let server = CannedServer::start(
            200,
            r#"{"error":[],"result":{"XXBTZUSD":{"a":["100.2","1","1.000"],"b":["100.1","2","2.000"],"c":["100.15","0.1"]}}}"#,
        )
        .await;
        let source = KrakenSource::new(client()).with_base_url(&server.base_url);

        let ticker = source.fetch_ticker(&btc()).await.unwrap();
        assert_eq!(ticker, Ticker::new(dec!(100.1), dec!(100.2), dec!(100.15)));
        assert_eq!(server.request_lines(), vec!["GET /0/public/Ticker?pair=XBTUSDT HTTP/1.1"]);
    }

    #[tokio::test]
    async fn test_kraken_unknown_pair_is_unsupported() {
        let server = CannedServer::start(200, r#"{"error":["EQuery:Unknown asset pair"]}"#).await;
        let source = KrakenSource::new(client()).with_base_url(&server.base_url);
        assert_eq!(
            source.fetch_ticker(&btc()).await,
            Err(FetchError::Unsupported("BTC/USDT".to_string()))
        );

        // Other venue errors are passed through
        let server = CannedServer::start(200, r#"{"error":["EService:Unavailable"]}"#).await;
        let source = KrakenSource::new(client()).with_base_url(&server.base_url);
        assert_eq!(
            source.fetch_ticker(&btc()).await,
            Err(FetchError::Venue("EService:Unavailable".to_string()))
        );
    }

    #[tokio::test]
    async fn test_coinbase_fetch() {
        let server = CannedServer::start(200, r#"{"ask":"100.6","bid":"100.5","price":"100.55"}"#).await;
        let source = CoinbaseSource::new(client()).with_base_url(&server.base_url);

        let ticker = source.fetch_ticker(&btc()).await.unwrap();
        assert_eq!(ticker, Ticker::new(dec!(100.5), dec!(100.6), dec!(100.55)));
        assert_eq!(server.request_lines(), vec!["GET /products/BTC-USDT/ticker HTTP/1.1"]);
    }

    #[tokio::test]
    async fn test_coinbase_unknown_product_is_unsupported() {
        let server = CannedServer::start(404, r#"{"message":"NotFound"}"#).await;
        let source = CoinbaseSource::new(client()).with_base_url(&server.base_url);
        assert_eq!(
            source.fetch_ticker(&btc()).await,
            Err(FetchError::Unsupported("BTC/USDT".to_string()))
        );

        let server = CannedServer::start(502, "{}").await;
        let source = CoinbaseSource::new(client()).with_base_url(&server.base_url);
        assert_eq!(source.fetch_ticker(&btc()).await, Err(FetchError::Status(502)));
    }

    #[test]
    fn test_partial_ticker_keeps_missing_fields_empty() {
        let ticker = parse_coinbase_ticker(&json!({"price": "1.0"})).unwrap();
        assert!(ticker.bid.is_none());
        assert!(ticker.ask.is_none());
    }
}
