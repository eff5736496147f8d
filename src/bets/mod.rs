//! Bet placement - validation, preview, submission
//!
//! Amount bounds and market state are checked locally before anything
//! touches the network; a rejected transaction is translated through the
//! contract error table.

use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::ledger::{Ledger, LedgerError, PulseClient, TxnOutcome};
use crate::pricing;
use crate::types::{Market, OCTAS_PER_MOVE};

/// Configured stake bounds, in Octas.
#[derive(Debug, Clone, Copy)]
pub struct BetLimits {
    pub min_octas: u64,
    pub max_octas: u64,
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            // 0.1 MOVE .. 10 MOVE
            min_octas: OCTAS_PER_MOVE / 10,
            max_octas: 10 * OCTAS_PER_MOVE,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BetError {
    #[error("bet of {amount} Octas is below the minimum of {min}")]
    BelowMinimum { amount: u64, min: u64 },

    #[error("bet of {amount} Octas is above the maximum of {max}")]
    AboveMaximum { amount: u64, max: u64 },

    #[error("market {0} is no longer accepting bets")]
    MarketClosed(u64),
}

/// Validate a bet before any network call.
pub fn validate_bet(
    market: &Market,
    amount: u64,
    limits: &BetLimits,
    now: i64,
) -> Result<(), BetError> {
    if amount < limits.min_octas {
        return Err(BetError::BelowMinimum {
            amount,
            min: limits.min_octas,
        });
    }
    if amount > limits.max_octas {
        return Err(BetError::AboveMaximum {
            amount,
            max: limits.max_octas,
        });
    }
    if !market.is_open(now) {
        return Err(BetError::MarketClosed(market.id));
    }
    Ok(())
}

/// Payout previewed for a bet against the current pool snapshot. Display
/// quantity; the ledger owns the canonical number once the bet lands.
pub fn preview_payout(market: &Market, is_yes: bool, amount: u64) -> u64 {
    pricing::payout(
        amount,
        market.total_yes_stake,
        market.total_no_stake,
        is_yes,
    )
}

/// What went wrong placing a validated bet.
#[derive(Debug, Error)]
pub enum PlaceBetError {
    #[error(transparent)]
    Invalid(#[from] BetError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// On-chain rejection, already translated for the user.
    #[error("{0}")]
    Rejected(String),
}

/// Validate and submit a bet. Sponsorship, when configured, is applied
/// inside the ledger client's submit path.
pub async fn place_bet<L: Ledger>(
    client: &PulseClient<L>,
    market: &Market,
    is_yes: bool,
    amount: u64,
    limits: &BetLimits,
    now: i64,
) -> Result<TxnOutcome, PlaceBetError> {
    validate_bet(market, amount, limits, now)?;

    let function = client.function_id("position", "place_bet");
    let outcome = client
        .ledger()
        .submit(
            &function,
            vec![
                json!(market.id.to_string()),
                json!(is_yes),
                json!(amount.to_string()),
            ],
        )
        .await?;

    if !outcome.success {
        return Err(PlaceBetError::Rejected(outcome.user_message()));
    }

    info!(
        market_id = market.id,
        is_yes,
        amount,
        hash = %outcome.transaction_hash,
        "bet placed"
    );
    Ok(outcome)
}
