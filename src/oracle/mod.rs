//! Oracle module - Pyth price feeds for market resolution
//!
//! Latest-price reads drive the resolution rule; the opaque update payload
//! is the verifiable evidence attached to settlement transactions. The
//! ledger re-verifies the payload itself — nothing here is trusted.

mod cache;
pub mod feeds;
mod hermes;

pub use cache::PriceCache;
pub use hermes::HermesClient;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::FeedId;

/// A price observation from one feed. Ephemeral; cached only within the
/// [`PriceCache`] TTL window.
#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub symbol: String,
    pub feed_id: FeedId,
    pub price: Decimal,
    pub confidence: Decimal,
    /// Unix seconds the oracle published this price.
    pub publish_time: i64,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected oracle response: {0}")]
    Malformed(String),
}

/// Read access to the price oracle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Latest price per feed, keyed by symbol. Feeds the oracle does not
    /// know are absent from the map rather than errors.
    async fn latest_prices(
        &self,
        feed_ids: &[FeedId],
    ) -> Result<HashMap<String, PriceQuote>, OracleError>;

    /// Verifiable update payload for the given feeds, ready to attach to a
    /// settlement transaction.
    async fn price_update_data(&self, feed_ids: &[FeedId]) -> Result<Vec<Vec<u8>>, OracleError>;
}
