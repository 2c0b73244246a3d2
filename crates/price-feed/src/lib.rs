//! Market data acquisition for the arbitrage agent
//!
//! Features:
//! - Ticker sources for centralized exchanges (Binance, Kraken, Coinbase)
//! - Yield sources for lending protocols (Aave, Compound)
//! - Concurrent fan-out per instrument with a per-call timeout
//! - Partial failure tolerance: failed sources are simply absent

pub mod aggregator;
pub mod exchanges;
pub mod feeds;
pub mod protocols;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use aggregator::{Acquisition, QuoteAggregator, SourceFailure, YieldCollection, YieldCollector};
pub use feeds::{build_ticker_sources, build_yield_sources, http_client, TickerSource, YieldSource};
