//! Ticker and quote types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FetchError, FetchResult, Instrument};

/// Raw top-of-book data as returned by a venue. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub last: Option<Decimal>,
}

impl Ticker {
    pub fn new(bid: Decimal, ask: Decimal, last: Decimal) -> Self {
        Self {
            bid: Some(bid),
            ask: Some(ask),
            last: Some(last),
        }
    }
}

/// Point-in-time price observation from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub source_id: String,
    pub instrument: Instrument,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    /// Normalize a venue ticker. A missing or negative bid/ask makes the
    /// ticker unusable; a missing or negative `last` becomes zero.
    pub fn from_ticker(
        source_id: impl Into<String>,
        instrument: Instrument,
        ticker: Ticker,
        observed_at: DateTime<Utc>,
    ) -> FetchResult<Self> {
        let bid = ticker
            .bid
            .ok_or_else(|| FetchError::Malformed("missing bid".to_string()))?;
        let ask = ticker
            .ask
            .ok_or_else(|| FetchError::Malformed("missing ask".to_string()))?;
        let last = ticker
            .last
            .filter(|last| !last.is_sign_negative())
            .unwrap_or(Decimal::ZERO);

        if bid.is_sign_negative() || ask.is_sign_negative() {
            return Err(FetchError::Malformed(format!("negative price bid={bid} ask={ask}")));
        }

        Ok(Self {
            source_id: source_id.into(),
            instrument,
            bid,
            ask,
            last,
            observed_at,
        })
    }

    /// `bid > ask`: the quote carries no usable spread
    pub fn is_crossed(&self) -> bool {
        self.bid > self.ask
    }

    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// Quotes for one instrument keyed by source, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBook {
    pub instrument: Instrument,
    quotes: Vec<Quote>,
}

impl QuoteBook {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            quotes: Vec::new(),
        }
    }

    /// Insert a quote, replacing any earlier quote from the same source in place
    pub fn insert(&mut self, quote: Quote) {
        match self.quotes.iter_mut().find(|q| q.source_id == quote.source_id) {
            Some(slot) => *slot = quote,
            None => self.quotes.push(quote),
        }
    }

    pub fn get(&self, source_id: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.source_id == source_id)
    }

    pub fn remove(&mut self, source_id: &str) -> Option<Quote> {
        let idx = self.quotes.iter().position(|q| q.source_id == source_id)?;
        Some(self.quotes.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.quotes.iter().map(|q| q.source_id.as_str())
    }
}
