//! Cycle driver - runs a scan job on a fixed interval until told to stop
//!
//! The driver is either `Running` or `Stopped`. A stop request is honoured
//! between cycles only; a cycle already in flight always completes. Failed
//! cycles are logged and followed by a longer backoff, they never stop the
//! driver.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info};

use arb_core::ScanResult;

use crate::sink::{CycleReport, ResultSink};

/// One acquisition + evaluation pass
#[async_trait]
pub trait CycleJob: Send + Sync {
    type Item: Send + Sync + 'static;

    fn name(&self) -> &'static str;
    async fn run_cycle(&self) -> ScanResult<Vec<Self::Item>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

/// Driver timing
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub agent_id: String,
    pub scan_interval: Duration,
    pub error_backoff: Duration,
}

impl DriverConfig {
    pub fn new(agent_id: impl Into<String>, scan_interval: Duration, error_backoff: Duration) -> Self {
        Self {
            agent_id: agent_id.into(),
            scan_interval,
            error_backoff,
        }
    }
}

/// Driver statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverStats {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub items_emitted: u64,
}

/// Runs a [`CycleJob`] forever, handing each cycle's findings to a sink
pub struct CycleDriver<J: CycleJob> {
    job: J,
    sink: Arc<dyn ResultSink<J::Item>>,
    config: DriverConfig,
    running: AtomicBool,
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
    items_emitted: AtomicU64,
}

impl<J: CycleJob> CycleDriver<J> {
    pub fn new(job: J, sink: Arc<dyn ResultSink<J::Item>>, config: DriverConfig) -> Self {
        Self {
            job,
            sink,
            config,
            running: AtomicBool::new(false),
            cycles_completed: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            items_emitted: AtomicU64::new(0),
        }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    pub fn state(&self) -> DriverState {
        if self.running.load(Ordering::Acquire) {
            DriverState::Running
        } else {
            DriverState::Stopped
        }
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            items_emitted: self.items_emitted.load(Ordering::Relaxed),
        }
    }

    /// Run until `shutdown` carries `true` or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> DriverStats {
        let name = self.job.name();
        let agent = self.config.agent_id.as_str();

        self.running.store(true, Ordering::Release);
        info!(agent, job = name, "{} started - scanning every {:?}", agent, self.config.scan_interval);

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let wait = self.run_one().await;

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = stop_requested(&mut shutdown) => {
                    debug!(agent, job = name, "shutdown requested");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::Release);

        let stats = self.stats();
        info!(
            agent,
            job = name,
            cycles = stats.cycles_completed,
            failed = stats.cycles_failed,
            "{} stopped. Found {} {}.",
            agent,
            stats.items_emitted,
            match name {
                "yield" => "yield offers",
                _ => "opportunities",
            }
        );
        stats
    }

    /// Run a single cycle and return how long to wait before the next one
    async fn run_one(&self) -> Duration {
        let start = Instant::now();

        match self.job.run_cycle().await {
            Ok(items) => {
                let cycle = self.cycles_completed.fetch_add(1, Ordering::Relaxed) + 1;
                self.items_emitted.fetch_add(items.len() as u64, Ordering::Relaxed);

                self.sink
                    .publish(CycleReport {
                        job: self.job.name(),
                        cycle,
                        finished_at: Utc::now(),
                        elapsed: start.elapsed(),
                        items,
                    })
                    .await;

                self.config.scan_interval
            }
            Err(e) => {
                self.cycles_failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    agent = %self.config.agent_id,
                    job = self.job.name(),
                    error = %e,
                    backoff = ?self.config.error_backoff,
                    "Scan cycle failed"
                );
                self.config.error_backoff
            }
        }
    }
}

/// Resolves once a stop is signalled; a dropped sender counts as a stop
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ChannelSink, LatestSink};
    use arb_core::ScanError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays scripted cycle outcomes, then keeps returning empty batches
    struct ScriptedJob {
        outcomes: Mutex<VecDeque<ScanResult<Vec<u32>>>>,
        cycle_time: Duration,
        started: AtomicU64,
    }

    impl ScriptedJob {
        fn new(outcomes: Vec<ScanResult<Vec<u32>>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                cycle_time: Duration::ZERO,
                started: AtomicU64::new(0),
            }
        }

        fn with_cycle_time(mut self, cycle_time: Duration) -> Self {
            self.cycle_time = cycle_time;
            self
        }
    }

    #[async_trait]
    impl CycleJob for ScriptedJob {
        type Item = u32;

        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn run_cycle(&self) -> ScanResult<Vec<u32>> {
            self.started.fetch_add(1, Ordering::Relaxed);
            if !self.cycle_time.is_zero() {
                tokio::time::sleep(self.cycle_time).await;
            }
            let next = self.outcomes.lock().pop_front();
            next.unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn config() -> DriverConfig {
        DriverConfig::new("test-agent", Duration::from_secs(30), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_each_cycle_in_order() {
        let job = ScriptedJob::new(vec![Ok(vec![1, 2]), Ok(vec![]), Ok(vec![3])]);
        let (sink, mut rx) = ChannelSink::<u32>::channel(16);
        let driver = Arc::new(CycleDriver::new(job, Arc::new(sink), config()));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn({
            let driver = Arc::clone(&driver);
            async move { driver.run(stop_rx).await }
        });

        let first = rx.recv().await.unwrap();
        assert_eq!((first.cycle, first.items.clone()), (1, vec![1, 2]));
        assert_eq!(first.job, "scripted");
        assert_eq!(driver.state(), DriverState::Running);

        let second = rx.recv().await.unwrap();
        assert_eq!((second.cycle, second.items.len()), (2, 0));

        let third = rx.recv().await.unwrap();
        assert_eq!((third.cycle, third.items.clone()), (3, vec![3]));

        stop_tx.send(true).unwrap();
        let stats = handle.await.unwrap();

        assert_eq!(driver.state(), DriverState::Stopped);
        assert_eq!(stats.items_emitted, 3);
        assert_eq!(stats.cycles_failed, 0);
        assert!(stats.cycles_completed >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_scan_interval_between_cycles() {
        let job = ScriptedJob::new(vec![]);
        let sink = Arc::new(LatestSink::<u32>::new());
        let driver = Arc::new(CycleDriver::new(job, sink.clone(), config()));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn({
            let driver = Arc::clone(&driver);
            async move { driver.run(stop_rx).await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.reports_received(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sink.reports_received(), 2);

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_backs_off_and_recovers() {
        let job = ScriptedJob::new(vec![
            Err(ScanError::NoMarketData { instruments: 2 }),
            Ok(vec![7]),
        ]);
        let sink = Arc::new(LatestSink::<u32>::new());
        let driver = Arc::new(CycleDriver::new(job, sink.clone(), config()));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn({
            let driver = Arc::clone(&driver);
            async move { driver.run(stop_rx).await }
        });

        // The normal interval is not enough after a failure
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(driver.stats().cycles_failed, 1);
        assert_eq!(sink.reports_received(), 0);
        assert_eq!(driver.state(), DriverState::Running);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sink.reports_received(), 1);
        assert_eq!(sink.latest().unwrap().items, vec![7]);

        stop_tx.send(true).unwrap();
        let stats = handle.await.unwrap();
        assert_eq!(stats.cycles_failed, 1);
        assert_eq!(stats.items_emitted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_does_not_interrupt_running_cycle() {
        let job = ScriptedJob::new(vec![Ok(vec![1])]).with_cycle_time(Duration::from_secs(5));
        let sink = Arc::new(LatestSink::<u32>::new());
        let driver = Arc::new(CycleDriver::new(job, sink.clone(), config()));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn({
            let driver = Arc::clone(&driver);
            async move { driver.run(stop_rx).await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(driver.job().started.load(Ordering::Relaxed), 1);
        stop_tx.send(true).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats.cycles_completed, 1);
        assert_eq!(sink.latest().unwrap().items, vec![1]);
        assert_eq!(driver.job().started.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_before_start_runs_nothing() {
        let job = ScriptedJob::new(vec![Ok(vec![1])]);
        let sink = Arc::new(LatestSink::<u32>::new());
        let driver = CycleDriver::new(job, sink.clone(), config());
        let (_stop_tx, stop_rx) = watch::channel(true);

        let stats = driver.run(stop_rx).await;
        assert_eq!(stats.cycles_completed, 0);
        assert_eq!(sink.reports_received(), 0);
        assert_eq!(driver.state(), DriverState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_stops_driver() {
        let job = ScriptedJob::new(vec![]);
        let driver = CycleDriver::new(job, Arc::new(LatestSink::<u32>::new()), config());
        let (stop_tx, stop_rx) = watch::channel(false);
        drop(stop_tx);

        let stats = driver.run(stop_rx).await;
        assert_eq!(stats.cycles_completed, 1);
    }
}
