//! Short-TTL price cache
//!
//! Bounds outbound oracle calls across all consumers in the process. Cache
//! reads never touch the network; a miss takes the fetch lock, so
//! concurrent misses collapse into one outstanding request. Data older
//! than the TTL is never served.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::{OracleError, PriceFeed, PriceQuote};
use crate::types::FeedId;

pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(1);

#[derive(Default)]
struct CacheState {
    data: HashMap<String, PriceQuote>,
    last_fetch: Option<Instant>,
}

/// TTL cache over a [`PriceFeed`] for a fixed set of feeds.
pub struct PriceCache<F> {
    feed: F,
    feed_ids: Vec<FeedId>,
    ttl: Duration,
    state: RwLock<CacheState>,
    /// Serializes refreshes; readers never take it.
    fetch_lock: tokio::sync::Mutex<()>,
}

impl<F: PriceFeed> PriceCache<F> {
    pub fn new(feed: F, feed_ids: Vec<FeedId>, ttl: Duration) -> Self {
        Self {
            feed,
            feed_ids,
            ttl,
            state: RwLock::new(CacheState::default()),
            fetch_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn read_fresh(&self) -> Option<HashMap<String, PriceQuote>> {
        let state = self.state.read().ok()?;
        match state.last_fetch {
            Some(at) if at.elapsed() < self.ttl && !state.data.is_empty() => {
                Some(state.data.clone())
            }
            _ => None,
        }
    }

    fn store(&self, data: HashMap<String, PriceQuote>) {
        if let Ok(mut state) = self.state.write() {
            state.data = data;
            state.last_fetch = Some(Instant::now());
        }
    }

    /// Latest prices for the configured feed set, keyed by symbol.
    pub async fn latest_prices(&self) -> Result<HashMap<String, PriceQuote>, OracleError> {
        if let Some(cached) = self.read_fresh() {
            return Ok(cached);
        }

        let _flight = self.fetch_lock.lock().await;
        // Another miss may have refreshed while we waited for the lock.
        if let Some(cached) = self.read_fresh() {
            return Ok(cached);
        }

        let fresh = self.feed.latest_prices(&self.feed_ids).await?;
        self.store(fresh.clone());
        Ok(fresh)
    }

    /// Latest price for one symbol, if the oracle serves it.
    pub async fn price(&self, symbol: &str) -> Result<Option<PriceQuote>, OracleError> {
        Ok(self.latest_prices().await?.get(symbol).cloned())
    }

    /// Drop the cached data; the next read refetches.
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.state.write() {
            state.data.clear();
            state.last_fetch = None;
        }
    }

    /// Bypass the TTL and refetch now.
    pub async fn force_refresh(&self) -> Result<HashMap<String, PriceQuote>, OracleError> {
        self.invalidate();
        self.latest_prices().await
    }
}
