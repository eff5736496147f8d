//! Pulse Resolution Worker
//!
//! Polls for markets past their resolution time and proposes settlement to
//! the ledger with Pyth price evidence attached.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pulse::config::AppConfig;
use pulse::ledger::{PulseClient, RemoteSigner, RestLedger};
use pulse::oracle::HermesClient;
use pulse::resolution::ResolutionWorker;
use pulse::sponsorship::GasStation;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;
    info!(config = %config.digest(), "starting Pulse resolution worker");

    let signer = Arc::new(RemoteSigner::new(
        &config.ledger.signer_url,
        config.worker.resolver_address.clone(),
    ));
    let gas_station = config
        .sponsorship
        .api_key()
        .map(|key| GasStation::new(&config.sponsorship.gas_station_url, key));
    let ledger = RestLedger::new(
        &config.ledger.fullnode_url,
        signer,
        gas_station,
        Duration::from_millis(config.ledger.confirmation_timeout_ms),
    );
    let client = PulseClient::new(ledger, config.worker.module_address.clone());
    let feed = HermesClient::new(&config.oracle.hermes_url);

    let worker = ResolutionWorker::new(
        client,
        feed,
        Duration::from_secs(config.worker.poll_interval_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, finishing in-flight cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    worker.run(shutdown_rx).await;
    info!("resolution worker stopped");
    Ok(())
}
