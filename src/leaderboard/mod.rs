//! Leaderboard - ranked user stats with a short-lived cache
//!
//! Ranking is computed over the set of users this process has seen touch
//! the stats endpoint. The set is in-memory and lost on restart; an
//! indexer-backed population is the production follow-up. Entries are
//! ranked by win rate, ties broken by staked volume.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::ledger::{Ledger, PulseClient};
use crate::types::UserStats;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub address: String,
    pub stats: UserStats,
    pub win_rate: f64,
}

/// Explicit cache object: `{data, last_fetch}` plus the known-user set,
/// owned by whoever serves the leaderboard.
pub struct Leaderboard {
    known_users: HashSet<String>,
    entries: Vec<LeaderboardEntry>,
    last_updated: Option<Instant>,
    ttl: Duration,
    top_n: usize,
}

impl Leaderboard {
    pub fn new(ttl: Duration, top_n: usize) -> Self {
        Self {
            known_users: HashSet::new(),
            entries: Vec::new(),
            last_updated: None,
            ttl,
            top_n,
        }
    }

    /// Record a user for future rankings. Called wherever stats are served.
    pub fn add_known_user(&mut self, address: impl Into<String>) {
        self.known_users.insert(address.into());
    }

    pub fn known_user_count(&self) -> usize {
        self.known_users.len()
    }

    /// Drop the cached ranking; the next read recomputes.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.last_updated = None;
    }

    fn is_fresh(&self) -> bool {
        matches!(self.last_updated, Some(at) if at.elapsed() < self.ttl)
    }

    /// Current top entries, recomputing from the ledger when the cache has
    /// expired. A user whose stats fetch fails is skipped this round, not
    /// dropped from the known set.
    pub async fn top<L: Ledger>(&mut self, client: &PulseClient<L>) -> Vec<LeaderboardEntry> {
        if self.is_fresh() {
            return self.entries.clone();
        }

        let mut entries = Vec::new();
        for address in &self.known_users {
            match client.user_stats(address).await {
                Ok(stats) => entries.push(LeaderboardEntry {
                    address: address.clone(),
                    win_rate: stats.win_rate(),
                    stats,
                }),
                Err(error) => {
                    warn!(%address, %error, "stats fetch failed, skipping this round");
                }
            }
        }

        entries.sort_by(|a, b| {
            b.win_rate
                .partial_cmp(&a.win_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.stats.total_volume.cmp(&a.stats.total_volume))
        });
        entries.truncate(self.top_n);

        self.entries = entries.clone();
        self.last_updated = Some(Instant::now());
        entries
    }
}
