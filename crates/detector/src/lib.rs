//! Arbitrage detection engine
//!
//! Features:
//! - Pairwise cross-venue opportunity detection
//! - Yield ranking across lending protocols
//! - Interval-driven scan cycles with error backoff
//! - Pluggable result sinks

pub mod driver;
pub mod ranking;
pub mod scanner;
pub mod sink;
pub mod strategies;

pub use driver::{CycleDriver, CycleJob, DriverConfig, DriverState, DriverStats};
pub use ranking::YieldRanker;
pub use scanner::{ArbitrageScanner, ScannerStats, YieldScanner};
pub use sink::{ChannelSink, CycleReport, LatestSink, LogSink, ResultSink};
pub use strategies::CrossVenueStrategy;
