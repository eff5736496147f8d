//! Core types used throughout Pulse
//!
//! Defines the market, position, and settlement data structures shared by
//! the client views, the claim orchestrator, and the resolution worker.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Octas per whole MOVE (smallest indivisible unit of the native currency).
pub const OCTAS_PER_MOVE: u64 = 100_000_000;

/// Convert an Octas amount to whole MOVE for display.
pub fn octas_to_move(octas: u64) -> Decimal {
    Decimal::from(octas) / Decimal::from(OCTAS_PER_MOVE)
}

/// Market category tag. Informational only; the settlement core never
/// branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Crypto,
    Sports,
    Politics,
    Entertainment,
    Weather,
    Custom,
}

impl Default for Category {
    fn default() -> Self {
        Category::Custom
    }
}

impl Category {
    /// Decode the on-chain category index.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Category::Crypto,
            1 => Category::Sports,
            2 => Category::Politics,
            3 => Category::Entertainment,
            4 => Category::Weather,
            _ => Category::Custom,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Crypto => write!(f, "crypto"),
            Category::Sports => write!(f, "sports"),
            Category::Politics => write!(f, "politics"),
            Category::Entertainment => write!(f, "entertainment"),
            Category::Weather => write!(f, "weather"),
            Category::Custom => write!(f, "custom"),
        }
    }
}

/// Pyth price feed identifier (32-byte hex). Stored lowercase without the
/// `0x` prefix; `Display` re-adds it for API calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedId(String);

impl FeedId {
    /// Normalize from a hex string, with or without the `0x` prefix.
    pub fn from_hex(raw: &str) -> Self {
        let trimmed = raw.trim_start_matches("0x").to_ascii_lowercase();
        FeedId(trimmed)
    }

    /// Build from raw feed id bytes as stored on-chain.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        FeedId(hex::encode(bytes))
    }

    /// Bare hex without the prefix.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0)
    }
}

/// Oracle resolution rule attached to auto-resolving markets.
///
/// Outcome is YES iff the feed price is above (or below, per `is_above`)
/// the threshold at resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    pub feed_id: FeedId,
    pub threshold: Decimal,
    pub is_above: bool,
}

/// A binary outcome market.
///
/// Stake totals are in Octas and only grow while the market is open.
/// `settled` flips to true exactly once; `outcome` is present iff settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Ledger-assigned id (monotonic).
    pub id: u64,
    pub question: String,
    pub category: Category,
    /// Unix seconds after which settlement becomes eligible.
    pub resolution_time: i64,
    pub total_yes_stake: u64,
    pub total_no_stake: u64,
    /// `true` = YES won. Present iff `settled`.
    pub outcome: Option<bool>,
    pub settled: bool,
    pub creator: String,
    pub created_at: i64,
    /// Present only for oracle-resolved markets.
    pub oracle_config: Option<OracleConfig>,
}

impl Market {
    /// Combined stake across both sides.
    pub fn total_pool(&self) -> u64 {
        self.total_yes_stake.saturating_add(self.total_no_stake)
    }

    /// Stake total for one side.
    pub fn side_total(&self, is_yes: bool) -> u64 {
        if is_yes {
            self.total_yes_stake
        } else {
            self.total_no_stake
        }
    }

    /// Still accepting bets at `now` (unix seconds).
    pub fn is_open(&self, now: i64) -> bool {
        !self.settled && now < self.resolution_time
    }
}

/// A user's stake on one side of one market. Immutable after creation
/// except for the one-way `claimed` flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub market_id: u64,
    /// Owner wallet address.
    pub user: String,
    pub is_yes: bool,
    /// Stake in Octas.
    pub amount: u64,
    pub created_at: i64,
    pub claimed: bool,
}

/// Aggregate betting record for one user, as reported by the position
/// module's stats view.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UserStats {
    pub total_bets: u64,
    pub total_won: u64,
    /// Lifetime staked volume in Octas.
    pub total_volume: u64,
}

impl UserStats {
    /// Win rate as a percentage (0.0 when no bets yet).
    pub fn win_rate(&self) -> f64 {
        if self.total_bets == 0 {
            return 0.0;
        }
        self.total_won as f64 / self.total_bets as f64 * 100.0
    }
}
