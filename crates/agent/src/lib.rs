//! Arbitrage agent
//!
//! Wires configured market data sources into the arbitrage and yield
//! scanners and runs one cycle driver per enabled scanner.

pub mod logging;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use arb_core::{AgentConfig, ConfigResult, Opportunity, YieldOffer};
use arb_detector::{ArbitrageScanner, CycleDriver, DriverConfig, DriverStats, LogSink, ResultSink, YieldScanner};
use arb_price_feed::{build_ticker_sources, build_yield_sources, http_client, TickerSource, YieldSource};

pub use logging::init_logging;

/// Where each scanner's cycle reports go
#[derive(Clone)]
pub struct AgentSinks {
    pub opportunities: Arc<dyn ResultSink<Opportunity>>,
    pub yields: Arc<dyn ResultSink<YieldOffer>>,
}

impl AgentSinks {
    /// Log every finding
    pub fn logging(agent_id: &str) -> Self {
        let sink = Arc::new(LogSink::new(agent_id));
        Self {
            opportunities: sink.clone(),
            yields: sink,
        }
    }
}

/// Final statistics of each driver that ran
#[derive(Debug, Clone, Default)]
pub struct AgentSummary {
    pub arbitrage: Option<DriverStats>,
    pub yields: Option<DriverStats>,
}

pub struct Agent {
    agent_id: String,
    arbitrage: Option<Arc<CycleDriver<ArbitrageScanner>>>,
    yields: Option<Arc<CycleDriver<YieldScanner>>>,
}

impl Agent {
    /// Build the agent against the live REST sources named in `config`
    pub fn from_config(config: &AgentConfig) -> ConfigResult<Self> {
        let ticker_sources = if config.arbitrage.enabled {
            let client = http_client(config.arbitrage.fetch_timeout())?;
            build_ticker_sources(&config.arbitrage.sources, &client)?
        } else {
            Vec::new()
        };

        let yield_sources = if config.yield_scan.enabled {
            let client = http_client(config.yield_scan.fetch_timeout())?;
            build_yield_sources(&config.yield_scan.protocols, &client, config.yield_scan.per_protocol_limit)?
        } else {
            Vec::new()
        };

        Self::with_sources(config, ticker_sources, yield_sources, AgentSinks::logging(&config.agent_id))
    }

    /// Build the agent from already resolved sources. Sources of a disabled
    /// scanner are ignored.
    pub fn with_sources(
        config: &AgentConfig,
        ticker_sources: Vec<Arc<dyn TickerSource>>,
        yield_sources: Vec<Arc<dyn YieldSource>>,
        sinks: AgentSinks,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let arbitrage = if config.arbitrage.enabled {
            let scanner = ArbitrageScanner::new(&config.arbitrage, ticker_sources)?;
            let driver_config = DriverConfig::new(
                config.agent_id.clone(),
                config.arbitrage.scan_interval(),
                config.arbitrage.error_backoff(),
            );
            Some(Arc::new(CycleDriver::new(scanner, sinks.opportunities, driver_config)))
        } else {
            None
        };

        let yields = if config.yield_scan.enabled {
            let scanner = YieldScanner::new(&config.yield_scan, yield_sources)?;
            let driver_config = DriverConfig::new(
                config.agent_id.clone(),
                config.yield_scan.scan_interval(),
                config.yield_scan.error_backoff(),
            );
            Some(Arc::new(CycleDriver::new(scanner, sinks.yields, driver_config)))
        } else {
            None
        };

        Ok(Self {
            agent_id: config.agent_id.clone(),
            arbitrage,
            yields,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn arbitrage(&self) -> Option<&CycleDriver<ArbitrageScanner>> {
        self.arbitrage.as_deref()
    }

    pub fn yields(&self) -> Option<&CycleDriver<YieldScanner>> {
        self.yields.as_deref()
    }

    /// Run every enabled driver until `shutdown` carries `true`
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> anyhow::Result<AgentSummary> {
        let arbitrage = self.arbitrage.clone().map(|driver| {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { driver.run(shutdown).await })
        });
        let yields = self.yields.clone().map(|driver| {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { driver.run(shutdown).await })
        });

        info!(
            agent = %self.agent_id,
            arbitrage = arbitrage.is_some(),
            yields = yields.is_some(),
            "Agent running"
        );

        let mut summary = AgentSummary::default();
        if let Some(handle) = arbitrage {
            summary.arbitrage = Some(handle.await?);
        }
        if let Some(handle) = yields {
            summary.yields = Some(handle.await?);
        }

        info!(agent = %self.agent_id, "Agent stopped");
        Ok(summary)
    }
}
