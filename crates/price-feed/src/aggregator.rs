//! Quote and yield aggregation - fans out to every source and waits for all
//! of them to settle

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

use arb_core::{FetchError, FetchResult, Instrument, Quote, QuoteBook, YieldOffer};

use crate::feeds::{TickerSource, YieldSource};

/// A source that produced nothing usable this cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: FetchError,
}

/// Result of sampling every source for one instrument
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub book: QuoteBook,
    pub failures: Vec<SourceFailure>,
    pub elapsed: Duration,
}

impl Acquisition {
    /// No source answered for this instrument
    pub fn is_total_failure(&self) -> bool {
        self.book.is_empty()
    }
}

/// Samples a fixed, ordered set of ticker sources
pub struct QuoteAggregator {
    sources: Vec<Arc<dyn TickerSource>>,
    fetch_timeout: Duration,
}

impl QuoteAggregator {
    pub fn new(sources: Vec<Arc<dyn TickerSource>>, fetch_timeout: Duration) -> Self {
        Self {
            sources,
            fetch_timeout,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    /// Request a ticker from every source concurrently and wait for all of
    /// them. Sources that fail, time out or return malformed data are absent
    /// from the book. The book preserves source order.
    pub async fn acquire(&self, instrument: &Instrument) -> Acquisition {
        let start = Instant::now();

        let fetches = self.sources.iter().map(|source| async move {
            let result = match timeout(self.fetch_timeout, source.fetch_ticker(instrument)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
            };

            let quote = result.and_then(|ticker| {
                Quote::from_ticker(source.id(), instrument.clone(), ticker, Utc::now())
            });
            (source.id(), quote)
        });

        let mut book = QuoteBook::new(instrument.clone());
        let mut failures = Vec::new();

        for (source_id, result) in join_all(fetches).await {
            match result {
                Ok(quote) => book.insert(quote),
                Err(error) => {
                    debug!(source = source_id, %instrument, %error, "source unavailable");
                    failures.push(SourceFailure {
                        source_id: source_id.to_string(),
                        error,
                    });
                }
            }
        }

        Acquisition {
            book,
            failures,
            elapsed: start.elapsed(),
        }
    }

    /// Acquire several instruments concurrently, results in input order
    pub async fn acquire_all(&self, instruments: &[Instrument]) -> Vec<Acquisition> {
        join_all(instruments.iter().map(|instrument| self.acquire(instrument))).await
    }
}

/// Offers gathered from every protocol that answered, in protocol order
#[derive(Debug, Clone, Default)]
pub struct YieldCollection {
    pub offers: Vec<YieldOffer>,
    pub answered: Vec<String>,
    pub failures: Vec<SourceFailure>,
}

impl YieldCollection {
    pub fn is_total_failure(&self) -> bool {
        self.answered.is_empty()
    }
}

/// Samples a fixed, ordered set of yield sources
pub struct YieldCollector {
    sources: Vec<Arc<dyn YieldSource>>,
    fetch_timeout: Duration,
}

impl YieldCollector {
    pub fn new(sources: Vec<Arc<dyn YieldSource>>, fetch_timeout: Duration) -> Self {
        Self {
            sources,
            fetch_timeout,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub async fn collect(&self) -> YieldCollection {
        let fetches = self.sources.iter().map(|source| async move {
            let result: FetchResult<Vec<YieldOffer>> =
                match timeout(self.fetch_timeout, source.fetch_offers()).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
                };
            (source.protocol(), result)
        });

        let mut collection = YieldCollection::default();

        for (protocol, result) in join_all(fetches).await {
            match result {
                Ok(offers) => {
                    debug!(protocol, count = offers.len(), "yield offers received");
                    collection.offers.extend(offers);
                    collection.answered.push(protocol.to_string());
                }
                Err(error) => {
                    warn!(protocol, %error, "yield source unavailable");
                    collection.failures.push(SourceFailure {
                        source_id: protocol.to_string(),
                        error,
                    });
                }
            }
        }

        collection
    }
}
