//! Wire format for the on-chain view functions
//!
//! The fullnode JSON API renders Move values with its own conventions:
//! u64 as decimal strings, `Option<T>` as `{ "vec": [] | [T] }`, and
//! `vector<u8>` as 0x-prefixed hex. These structs decode that shape and
//! convert into the domain types.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::types::{Category, FeedId, Market, OracleConfig, Position};

/// Decimal places of on-chain oracle thresholds (fixed-point USD, matching
/// the feed's 10^-8 exponent).
pub const PRICE_DECIMALS: u32 = 8;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid u64 field {field}: {value:?}")]
    InvalidU64 { field: &'static str, value: String },
    #[error("invalid i64 field {field}: {value:?}")]
    InvalidI64 { field: &'static str, value: String },
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, WireError> {
    value.parse::<u64>().map_err(|_| WireError::InvalidU64 {
        field,
        value: value.to_string(),
    })
}

fn parse_i64(field: &'static str, value: &str) -> Result<i64, WireError> {
    value.parse::<i64>().map_err(|_| WireError::InvalidI64 {
        field,
        value: value.to_string(),
    })
}

/// Move `Option<T>` as rendered by the JSON API.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveOption<T> {
    #[serde(default = "Vec::new")]
    pub vec: Vec<T>,
}

impl<T> MoveOption<T> {
    pub fn into_option(self) -> Option<T> {
        self.vec.into_iter().next()
    }
}

impl<T> Default for MoveOption<T> {
    fn default() -> Self {
        MoveOption { vec: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOracleConfig {
    /// 0x-prefixed hex of the 32-byte Pyth feed id.
    pub feed_id: String,
    /// Fixed-point USD threshold as a u64 string.
    pub threshold: String,
    pub is_above: bool,
}

impl RawOracleConfig {
    pub fn into_oracle_config(self) -> Result<OracleConfig, WireError> {
        let raw_threshold = parse_u64("threshold", &self.threshold)?;
        Ok(OracleConfig {
            feed_id: FeedId::from_hex(&self.feed_id),
            threshold: Decimal::from_i128_with_scale(raw_threshold as i128, PRICE_DECIMALS),
            is_above: self.is_above,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMarket {
    pub id: String,
    pub question: String,
    pub category: u8,
    pub resolution_time: String,
    pub total_yes_stake: String,
    pub total_no_stake: String,
    #[serde(default)]
    pub outcome: MoveOption<bool>,
    pub settled: bool,
    pub creator: String,
    pub created_at: String,
    #[serde(default)]
    pub oracle_config: MoveOption<RawOracleConfig>,
}

impl RawMarket {
    pub fn into_market(self) -> Result<Market, WireError> {
        let oracle_config = self
            .oracle_config
            .into_option()
            .map(RawOracleConfig::into_oracle_config)
            .transpose()?;
        Ok(Market {
            id: parse_u64("id", &self.id)?,
            question: self.question,
            category: Category::from_index(self.category),
            resolution_time: parse_i64("resolution_time", &self.resolution_time)?,
            total_yes_stake: parse_u64("total_yes_stake", &self.total_yes_stake)?,
            total_no_stake: parse_u64("total_no_stake", &self.total_no_stake)?,
            outcome: self.outcome.into_option(),
            settled: self.settled,
            creator: self.creator,
            created_at: parse_i64("created_at", &self.created_at)?,
            oracle_config,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPosition {
    pub id: String,
    pub market_id: String,
    pub user: String,
    pub is_yes: bool,
    pub amount: String,
    pub created_at: String,
    pub claimed: bool,
}

impl RawPosition {
    pub fn into_position(self) -> Result<Position, WireError> {
        Ok(Position {
            id: parse_u64("id", &self.id)?,
            market_id: parse_u64("market_id", &self.market_id)?,
            user: self.user,
            is_yes: self.is_yes,
            amount: parse_u64("amount", &self.amount)?,
            created_at: parse_i64("created_at", &self.created_at)?,
            claimed: self.claimed,
        })
    }
}
