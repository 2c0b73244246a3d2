//! Arbitrage agent
//!
//! Scans exchanges for cross-venue price gaps and lending protocols for the
//! best yields until interrupted.

use std::env;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use arb_agent::{init_logging, Agent};
use arb_core::AgentConfig;

const CONFIG_PATH_VAR: &str = "ARB_AGENT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "arb-agent.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config_path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AgentConfig::load(&config_path)?;

    init_logging(&config.logging)?;

    info!("Starting arbitrage agent v{}", env!("CARGO_PKG_VERSION"));
    info!(
        agent = %config.agent_id,
        config = %config_path,
        instruments = ?config.arbitrage.instruments,
        sources = ?config.arbitrage.sources,
        protocols = ?config.yield_scan.protocols,
        "Configuration loaded"
    );

    let agent = Agent::from_config(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install signal handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(true);
    });

    info!("Press Ctrl+C to shutdown");

    let summary = agent.run(shutdown_rx).await?;

    if let Some(stats) = summary.arbitrage {
        info!(
            cycles = stats.cycles_completed,
            failed = stats.cycles_failed,
            opportunities = stats.items_emitted,
            "Arbitrage scanner summary"
        );
    }
    if let Some(stats) = summary.yields {
        info!(
            cycles = stats.cycles_completed,
            failed = stats.cycles_failed,
            offers = stats.items_emitted,
            "Yield scanner summary"
        );
    }

    info!("Shutdown complete");
    Ok(())
}
