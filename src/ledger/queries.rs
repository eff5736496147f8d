//! Typed queries over the deployed Pulse modules
//!
//! Thin wrappers that name the view functions, pass arguments in the wire
//! encoding (u64s as strings), and decode the results into domain types.

use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;

use super::{errors::LedgerError, wire, Ledger};
use crate::positions::PositionWithMarket;
use crate::types::{Market, Position, UserStats};

/// Referral counters and earnings for one address.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferralStats {
    pub referral_count: u64,
    /// Lifetime referral earnings in Octas.
    pub total_earnings: u64,
}

/// Global welcome-bonus accounting.
#[derive(Debug, Clone, Copy, Default)]
pub struct BonusStats {
    pub total_issued: u64,
    pub total_used: u64,
}

/// Typed client over the deployed market/position/bonus/referral modules.
pub struct PulseClient<L> {
    ledger: L,
    module_address: String,
}

impl<L: Ledger> PulseClient<L> {
    pub fn new(ledger: L, module_address: impl Into<String>) -> Self {
        Self {
            ledger,
            module_address: module_address.into(),
        }
    }

    /// Fully qualified `address::module::name` identifier.
    pub fn function_id(&self, module: &str, name: &str) -> String {
        format!("{}::{}::{}", self.module_address, module, name)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// First return value of a view call.
    async fn view_first(&self, function: &str, args: Vec<Value>) -> Result<Value, LedgerError> {
        let result = self.ledger.view(function, args).await?;
        result
            .get(0)
            .cloned()
            .ok_or_else(|| LedgerError::Malformed(format!("{function} returned no values")))
    }

    fn decode_markets(function: &str, value: Value) -> Result<Vec<Market>, LedgerError> {
        let raw: Vec<wire::RawMarket> = serde_json::from_value(value)
            .map_err(|e| LedgerError::Malformed(format!("{function}: {e}")))?;
        raw.into_iter()
            .map(|m| {
                m.into_market()
                    .map_err(|e| LedgerError::Malformed(format!("{function}: {e}")))
            })
            .collect()
    }

    // ---- markets ----

    /// All currently unsettled markets.
    pub async fn active_markets(&self) -> Result<Vec<Market>, LedgerError> {
        let function = self.function_id("market_views", "get_active_markets");
        let value = self.view_first(&function, vec![]).await?;
        Self::decode_markets(&function, value)
    }

    /// Single market by ledger id.
    pub async fn market(&self, market_id: u64) -> Result<Market, LedgerError> {
        let function = self.function_id("market_views", "get_market");
        let value = self
            .view_first(&function, vec![json!(market_id.to_string())])
            .await?;
        let raw: wire::RawMarket = serde_json::from_value(value)
            .map_err(|e| LedgerError::Malformed(format!("{function}: {e}")))?;
        raw.into_market()
            .map_err(|e| LedgerError::Malformed(format!("{function}: {e}")))
    }

    pub async fn markets_paginated(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Market>, LedgerError> {
        let function = self.function_id("market_views", "get_markets_paginated");
        let value = self
            .view_first(
                &function,
                vec![json!(offset.to_string()), json!(limit.to_string())],
            )
            .await?;
        Self::decode_markets(&function, value)
    }

    /// Ledger-side payout preview. The local engine in [`crate::pricing`]
    /// computes the same number without a network round trip.
    pub async fn payout_preview(
        &self,
        market_id: u64,
        is_yes: bool,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        let function = self.function_id("market_views", "calculate_payout");
        let value = self
            .view_first(
                &function,
                vec![
                    json!(market_id.to_string()),
                    json!(is_yes),
                    json!(amount.to_string()),
                ],
            )
            .await?;
        decode_u64(&function, &value)
    }

    // ---- positions ----

    async fn positions_view(
        &self,
        name: &str,
        address: &str,
    ) -> Result<Vec<Position>, LedgerError> {
        let function = self.function_id("position", name);
        let value = self.view_first(&function, vec![json!(address)]).await?;
        let raw: Vec<wire::RawPosition> = serde_json::from_value(value)
            .map_err(|e| LedgerError::Malformed(format!("{function}: {e}")))?;
        raw.into_iter()
            .map(|p| {
                p.into_position()
                    .map_err(|e| LedgerError::Malformed(format!("{function}: {e}")))
            })
            .collect()
    }

    pub async fn user_positions(&self, address: &str) -> Result<Vec<Position>, LedgerError> {
        self.positions_view("get_user_positions", address).await
    }

    pub async fn user_active_positions(
        &self,
        address: &str,
    ) -> Result<Vec<Position>, LedgerError> {
        self.positions_view("get_user_active_positions", address)
            .await
    }

    pub async fn user_claimable_positions(
        &self,
        address: &str,
    ) -> Result<Vec<Position>, LedgerError> {
        self.positions_view("get_user_claimable_positions", address)
            .await
    }

    /// One consistent snapshot of a user's positions joined with their
    /// markets. A market fetch failure leaves that position with no market;
    /// the ledger view layer then keeps it out of the claimable bucket.
    pub async fn positions_with_markets(
        &self,
        address: &str,
    ) -> Result<Vec<PositionWithMarket>, LedgerError> {
        let positions = self.user_positions(address).await?;

        let mut markets: HashMap<u64, Option<Market>> = HashMap::new();
        for position in &positions {
            if markets.contains_key(&position.market_id) {
                continue;
            }
            let fetched = match self.market(position.market_id).await {
                Ok(market) => Some(market),
                Err(error) => {
                    warn!(market_id = position.market_id, %error, "market fetch failed");
                    None
                }
            };
            markets.insert(position.market_id, fetched);
        }

        Ok(positions
            .into_iter()
            .map(|position| {
                let market = markets.get(&position.market_id).cloned().flatten();
                PositionWithMarket { position, market }
            })
            .collect())
    }

    pub async fn user_stats(&self, address: &str) -> Result<UserStats, LedgerError> {
        let function = self.function_id("position", "get_user_stats");
        let result = self.ledger.view(&function, vec![json!(address)]).await?;
        // This view returns three values rather than one list.
        Ok(UserStats {
            total_bets: decode_u64_at(&function, &result, 0)?,
            total_won: decode_u64_at(&function, &result, 1)?,
            total_volume: decode_u64_at(&function, &result, 2)?,
        })
    }

    // ---- bonus ----

    pub async fn bonus_balance(&self, address: &str) -> Result<u64, LedgerError> {
        let function = self.function_id("bonus", "get_bonus_balance");
        let value = self.view_first(&function, vec![json!(address)]).await?;
        decode_u64(&function, &value)
    }

    pub async fn has_claimed_welcome_bonus(&self, address: &str) -> Result<bool, LedgerError> {
        let function = self.function_id("bonus", "has_claimed_welcome_bonus");
        let value = self.view_first(&function, vec![json!(address)]).await?;
        value
            .as_bool()
            .ok_or_else(|| LedgerError::Malformed(format!("{function}: expected bool")))
    }

    pub async fn welcome_bonus_amount(&self) -> Result<u64, LedgerError> {
        let function = self.function_id("bonus", "get_welcome_bonus_amount");
        let value = self.view_first(&function, vec![]).await?;
        decode_u64(&function, &value)
    }

    pub async fn bonus_stats(&self) -> Result<BonusStats, LedgerError> {
        let function = self.function_id("bonus", "get_bonus_stats");
        let result = self.ledger.view(&function, vec![]).await?;
        Ok(BonusStats {
            total_issued: decode_u64_at(&function, &result, 0)?,
            total_used: decode_u64_at(&function, &result, 1)?,
        })
    }

    // ---- referral ----

    pub async fn referral_stats(&self, address: &str) -> Result<ReferralStats, LedgerError> {
        let count_fn = self.function_id("referral", "get_referral_count");
        let earnings_fn = self.function_id("referral", "get_referral_earnings");
        let count = self.view_first(&count_fn, vec![json!(address)]).await?;
        let earnings = self
            .view_first(&earnings_fn, vec![json!(address)])
            .await?;
        Ok(ReferralStats {
            referral_count: decode_u64(&count_fn, &count)?,
            total_earnings: decode_u64(&earnings_fn, &earnings)?,
        })
    }

    pub async fn has_referrer(&self, address: &str) -> Result<bool, LedgerError> {
        let function = self.function_id("referral", "has_referrer");
        let value = self.view_first(&function, vec![json!(address)]).await?;
        value
            .as_bool()
            .ok_or_else(|| LedgerError::Malformed(format!("{function}: expected bool")))
    }

    /// The referrer address for a user, when one was registered.
    pub async fn referrer(&self, address: &str) -> Result<Option<String>, LedgerError> {
        let function = self.function_id("referral", "get_referrer");
        let value = self.view_first(&function, vec![json!(address)]).await?;
        let opt: wire::MoveOption<String> = serde_json::from_value(value)
            .map_err(|e| LedgerError::Malformed(format!("{function}: {e}")))?;
        Ok(opt.into_option())
    }
}

/// Decode a u64 rendered either as a JSON string or a bare number.
fn decode_u64(function: &str, value: &Value) -> Result<u64, LedgerError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    value
        .as_str()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| LedgerError::Malformed(format!("{function}: expected u64, got {value}")))
}

/// Decode the u64 at position `index` of a multi-value view result.
fn decode_u64_at(function: &str, result: &Value, index: usize) -> Result<u64, LedgerError> {
    let value = result
        .get(index)
        .ok_or_else(|| LedgerError::Malformed(format!("{function}: missing value {index}")))?;
    decode_u64(function, value)
}
