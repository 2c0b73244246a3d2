//! Result sinks - where each completed cycle's findings go

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use arb_core::{Opportunity, YieldOffer};

/// Ordered findings of one completed cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport<T> {
    pub job: &'static str,
    pub cycle: u64,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub items: Vec<T>,
}

/// Receives one report per successful cycle, in cycle order
#[async_trait]
pub trait ResultSink<T: Send + 'static>: Send + Sync {
    async fn publish(&self, report: CycleReport<T>);
}

/// Writes findings to the log
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    agent_id: String,
}

impl LogSink {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
        }
    }
}

#[async_trait]
impl ResultSink<Opportunity> for LogSink {
    async fn publish(&self, report: CycleReport<Opportunity>) {
        for opp in &report.items {
            info!(
                agent = %self.agent_id,
                instrument = %opp.instrument,
                buy = %opp.buy_source,
                sell = %opp.sell_source,
                "Arbitrage: buy on {} @ {:.2}, sell on {} @ {:.2}, profit {:.2}%",
                opp.buy_source,
                opp.buy_price,
                opp.sell_source,
                opp.sell_price,
                opp.profit_pct
            );
        }
    }
}

#[async_trait]
impl ResultSink<YieldOffer> for LogSink {
    async fn publish(&self, report: CycleReport<YieldOffer>) {
        if report.items.is_empty() {
            return;
        }

        info!(agent = %self.agent_id, count = report.items.len(), "Top DeFi yields");
        for (rank, offer) in report.items.iter().enumerate() {
            info!(
                agent = %self.agent_id,
                "{}. {} - {}: {:.2}% APY ({})",
                rank + 1,
                offer.protocol,
                offer.asset,
                offer.apy,
                offer.offer_type
            );
        }
    }
}

/// Keeps the most recent report in memory
pub struct LatestSink<T> {
    latest: RwLock<Option<CycleReport<T>>>,
    received: AtomicU64,
}

impl<T: Clone> LatestSink<T> {
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(None),
            received: AtomicU64::new(0),
        }
    }

    pub fn latest(&self) -> Option<CycleReport<T>> {
        self.latest.read().clone()
    }

    pub fn reports_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

impl<T: Clone> Default for LatestSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ResultSink<T> for LatestSink<T> {
    async fn publish(&self, report: CycleReport<T>) {
        *self.latest.write() = Some(report);
        self.received.fetch_add(1, Ordering::Relaxed);
    }
}

/// Forwards reports over a bounded channel. A full or closed channel drops
/// the report so a slow consumer never stalls scanning.
pub struct ChannelSink<T> {
    tx: mpsc::Sender<CycleReport<T>>,
}

impl<T> ChannelSink<T> {
    pub fn new(tx: mpsc::Sender<CycleReport<T>>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<CycleReport<T>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl<T: Send + 'static> ResultSink<T> for ChannelSink<T> {
    async fn publish(&self, report: CycleReport<T>) {
        let cycle = report.cycle;
        if let Err(e) = self.tx.try_send(report) {
            warn!(cycle, error = %e, "dropping cycle report");
        }
    }
}
