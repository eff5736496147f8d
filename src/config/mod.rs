//! Configuration management for Pulse
//!
//! Loads from config files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub worker: WorkerConfig,
    pub ledger: LedgerConfig,
    pub oracle: OracleConfig,
    pub sponsorship: SponsorshipConfig,
    pub bets: BetsConfig,
    pub leaderboard: LeaderboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Worker version tag for logging
    pub tag: String,
    /// Resolution poll cadence in seconds
    pub poll_interval_secs: u64,
    /// Address the Pulse modules are deployed under
    pub module_address: String,
    /// Account the resolver signs settlement transactions from
    pub resolver_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Fullnode REST endpoint
    pub fullnode_url: String,
    /// Signing service endpoint (wallet custody lives outside this process)
    pub signer_url: String,
    /// How long to wait for a submitted transaction to execute, in ms
    pub confirmation_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Pyth Hermes endpoint
    pub hermes_url: String,
    /// Price cache TTL in milliseconds
    pub price_ttl_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SponsorshipConfig {
    /// Gas station endpoint; sponsorship is enabled iff the API key env
    /// var is set
    pub gas_station_url: String,
    /// Environment variable holding the gas station API key
    pub api_key_env: String,
}

impl SponsorshipConfig {
    /// The configured API key, when sponsorship is enabled.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BetsConfig {
    /// Minimum stake in Octas
    pub min_bet_octas: u64,
    /// Maximum stake in Octas
    pub max_bet_octas: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    /// Ranking cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Entries served per period
    pub top_n: usize,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Worker defaults
            .set_default("worker.tag", env!("CARGO_PKG_VERSION"))?
            .set_default("worker.poll_interval_secs", 60)?
            .set_default(
                "worker.module_address",
                "0x78a349ed835712bb5056761595110896ccf3497de4ef8af46acf8cc719b32e8e",
            )?
            .set_default("worker.resolver_address", "")?
            // Ledger defaults
            .set_default(
                "ledger.fullnode_url",
                "https://testnet.movementnetwork.xyz/v1",
            )?
            .set_default("ledger.signer_url", "http://127.0.0.1:4003")?
            .set_default("ledger.confirmation_timeout_ms", 30_000)?
            // Oracle defaults
            .set_default("oracle.hermes_url", "https://hermes.pyth.network")?
            .set_default("oracle.price_ttl_ms", 1_000)?
            // Sponsorship defaults
            .set_default(
                "sponsorship.gas_station_url",
                "https://api.shinami.com/aptos/gas/v1",
            )?
            .set_default("sponsorship.api_key_env", "SHINAMI_API_KEY")?
            // Bet limits: 0.1 MOVE .. 10 MOVE
            .set_default("bets.min_bet_octas", 10_000_000)?
            .set_default("bets.max_bet_octas", 1_000_000_000)?
            // Leaderboard defaults
            .set_default("leaderboard.cache_ttl_secs", 60)?
            .set_default("leaderboard.top_n", 10)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PULSE_*)
            .add_source(Environment::with_prefix("PULSE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "tag={} module={} poll={}s fullnode={} sponsorship={}",
            self.worker.tag,
            self.worker.module_address,
            self.worker.poll_interval_secs,
            self.ledger.fullnode_url,
            self.sponsorship.api_key().is_some(),
        )
    }

    /// Validate the fields the worker cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.worker.poll_interval_secs == 0 {
            bail!("worker.poll_interval_secs must be positive");
        }
        if self.worker.module_address.is_empty() {
            bail!("worker.module_address is not set");
        }
        if self.worker.resolver_address.is_empty() {
            bail!("worker.resolver_address is not set (PULSE__WORKER__RESOLVER_ADDRESS)");
        }
        if self.bets.min_bet_octas == 0 || self.bets.min_bet_octas > self.bets.max_bet_octas {
            bail!(
                "invalid bet limits: min={} max={}",
                self.bets.min_bet_octas,
                self.bets.max_bet_octas
            );
        }
        Ok(())
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
