//! Arbitrage and yield scanners - one acquisition + evaluation pass each

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use arb_core::{
    ArbitrageConfig, ConfigError, ConfigResult, Instrument, Opportunity, QuoteBook, ScanError,
    ScanResult, YieldOffer, YieldScanConfig,
};
use arb_price_feed::{Acquisition, QuoteAggregator, TickerSource, YieldCollector, YieldSource};

use crate::driver::CycleJob;
use crate::ranking::YieldRanker;
use crate::strategies::CrossVenueStrategy;

/// Cross-venue arbitrage scanner
pub struct ArbitrageScanner {
    instruments: Vec<Instrument>,
    aggregator: QuoteAggregator,
    strategy: CrossVenueStrategy,
    parallel_instruments: bool,
}

impl ArbitrageScanner {
    /// Fails when there is nothing to scan
    pub fn new(config: &ArbitrageConfig, sources: Vec<Arc<dyn TickerSource>>) -> ConfigResult<Self> {
        if config.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        Ok(Self {
            instruments: config.instruments.clone(),
            aggregator: QuoteAggregator::new(sources, config.fetch_timeout()),
            strategy: CrossVenueStrategy::from_config(config),
            parallel_instruments: config.parallel_instruments,
        })
    }

    /// One full cycle: sample every instrument, then evaluate the books.
    ///
    /// Instruments with no answering source contribute nothing; the cycle
    /// only fails when no source answered for any instrument.
    pub async fn scan_once(&self) -> ScanResult<Vec<Opportunity>> {
        let start = Instant::now();

        let acquisitions = if self.parallel_instruments {
            self.aggregator.acquire_all(&self.instruments).await
        } else {
            let mut acquisitions = Vec::with_capacity(self.instruments.len());
            for instrument in &self.instruments {
                acquisitions.push(self.aggregator.acquire(instrument).await);
            }
            acquisitions
        };

        for acquisition in &acquisitions {
            log_acquisition(acquisition);
        }

        if acquisitions.iter().all(Acquisition::is_total_failure) {
            return Err(ScanError::NoMarketData {
                instruments: self.instruments.len(),
            });
        }

        let books: Vec<QuoteBook> = acquisitions.into_iter().map(|a| a.book).collect();
        let opportunities = self.evaluate(&books, Utc::now());

        if opportunities.is_empty() {
            debug!("Scan completed in {:?}, no opportunities", start.elapsed());
        } else {
            info!("Found {} opportunities in {:?}", opportunities.len(), start.elapsed());
        }

        Ok(opportunities)
    }

    /// Evaluate completed books in order. Pure: the same books and timestamp
    /// always give the same output.
    pub fn evaluate(&self, books: &[QuoteBook], detected_at: DateTime<Utc>) -> Vec<Opportunity> {
        if self.parallel_instruments {
            books
                .par_iter()
                .map(|book| self.strategy.find_opportunities(book, detected_at))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            books
                .iter()
                .flat_map(|book| self.strategy.find_opportunities(book, detected_at))
                .collect()
        }
    }

    pub fn strategy(&self) -> &CrossVenueStrategy {
        &self.strategy
    }

    pub fn stats(&self) -> ScannerStats {
        ScannerStats {
            instrument_count: self.instruments.len(),
            source_count: self.aggregator.source_count(),
        }
    }
}

fn log_acquisition(acquisition: &Acquisition) {
    let instrument = &acquisition.book.instrument;

    if acquisition.is_total_failure() {
        warn!(
            %instrument,
            failed = acquisition.failures.len(),
            "No source returned a usable quote"
        );
    } else if !acquisition.failures.is_empty() {
        let failed: Vec<&str> = acquisition.failures.iter().map(|f| f.source_id.as_str()).collect();
        debug!(
            %instrument,
            quoted = acquisition.book.len(),
            ?failed,
            elapsed = ?acquisition.elapsed,
            "Partial quote set"
        );
    }
}

#[async_trait]
impl CycleJob for ArbitrageScanner {
    type Item = Opportunity;

    fn name(&self) -> &'static str {
        "arbitrage"
    }

    async fn run_cycle(&self) -> ScanResult<Vec<Opportunity>> {
        self.scan_once().await
    }
}

/// Cross-protocol yield scanner
pub struct YieldScanner {
    collector: YieldCollector,
    ranker: YieldRanker,
}

impl YieldScanner {
    pub fn new(config: &YieldScanConfig, sources: Vec<Arc<dyn YieldSource>>) -> ConfigResult<Self> {
        if sources.is_empty() {
            return Err(ConfigError::NoProtocols);
        }

        Ok(Self {
            collector: YieldCollector::new(sources, config.fetch_timeout()),
            ranker: YieldRanker::new(config.top_k),
        })
    }

    /// Gather offers from every protocol and keep the best `top_k`
    pub async fn scan_once(&self) -> ScanResult<Vec<YieldOffer>> {
        debug!("Scanning DeFi protocols");
        let collection = self.collector.collect().await;

        if collection.is_total_failure() {
            return Err(ScanError::NoYieldData {
                protocols: self.collector.source_count(),
            });
        }

        Ok(self.ranker.rank(collection.offers))
    }
}

#[async_trait]
impl CycleJob for YieldScanner {
    type Item = YieldOffer;

    fn name(&self) -> &'static str {
        "yield"
    }

    async fn run_cycle(&self) -> ScanResult<Vec<YieldOffer>> {
        self.scan_once().await
    }
}

/// Scanner statistics
#[derive(Debug, Clone)]
pub struct ScannerStats {
    pub instrument_count: usize,
    pub source_count: usize,
}
