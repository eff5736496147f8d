//! Market lifecycle - Open, pending resolution, settled
//!
//! The settled flag is a one-way transition owned by the ledger; this module
//! holds the pure predicates and the local transition used to mirror it.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Market, OracleConfig};

/// Lifecycle phase of a market at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketPhase {
    Open,
    PendingResolution,
    Settled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettleError {
    #[error("market {0} is already settled")]
    AlreadySettled(u64),
}

/// Phase of `market` at `now` (unix seconds).
pub fn phase(market: &Market, now: i64) -> MarketPhase {
    if market.settled {
        MarketPhase::Settled
    } else if now >= market.resolution_time {
        MarketPhase::PendingResolution
    } else {
        MarketPhase::Open
    }
}

/// Resolution time has passed and the market is not yet settled.
pub fn is_pending_resolution(market: &Market, now: i64) -> bool {
    now >= market.resolution_time && !market.settled
}

/// Apply the settle transition locally.
///
/// The ledger enforces the same precondition on-chain; an "already settled"
/// rejection there is benign for retrying callers, but calling this twice
/// locally is a logic error and is reported as one.
pub fn settle(market: &Market, outcome: bool) -> Result<Market, SettleError> {
    if market.settled {
        return Err(SettleError::AlreadySettled(market.id));
    }
    let mut settled = market.clone();
    settled.settled = true;
    settled.outcome = Some(outcome);
    Ok(settled)
}

/// Outcome implied by an oracle price against the market's threshold rule.
///
/// YES iff the price is strictly above the threshold for `is_above` rules,
/// strictly below for the inverse. Equality resolves NO either way.
pub fn oracle_outcome(config: &OracleConfig, price: Decimal) -> bool {
    if config.is_above {
        price > config.threshold
    } else {
        price < config.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, FeedId};
    use rust_decimal_macros::dec;

    fn open_market(resolution_time: i64) -> Market {
        Market {
            id: 7,
            question: "ETH above 5k by Friday?".to_string(),
            category: Category::Crypto,
            resolution_time,
            total_yes_stake: 300_000_000,
            total_no_stake: 100_000_000,
            outcome: None,
            settled: false,
            creator: "0xcafe".to_string(),
            created_at: 0,
            oracle_config: None,
        }
    }

    #[test]
    fn phase_progression() {
        let market = open_market(1_000);
        assert_eq!(phase(&market, 999), MarketPhase::Open);
        assert_eq!(phase(&market, 1_000), MarketPhase::PendingResolution);

        let settled = settle(&market, true).unwrap();
        assert_eq!(phase(&settled, 0), MarketPhase::Settled);
    }

    #[test]
    fn pending_resolution_boundary() {
        let market = open_market(1_000);
        assert!(!is_pending_resolution(&market, 999));
        assert!(is_pending_resolution(&market, 1_000));
        assert!(is_pending_resolution(&market, 2_000));
    }

    #[test]
    fn settle_fixes_outcome_once() {
        let market = open_market(1_000);
        let settled = settle(&market, false).unwrap();
        assert!(settled.settled);
        assert_eq!(settled.outcome, Some(false));

        // Second transition is a caller error, and the terminal state is
        // unchanged by the attempt.
        assert_eq!(settle(&settled, false), Err(SettleError::AlreadySettled(7)));
        assert_eq!(settled.outcome, Some(false));
    }

    #[test]
    fn oracle_outcome_threshold_rule() {
        let above = OracleConfig {
            feed_id: FeedId::from_hex("e62d"),
            threshold: dec!(100000),
            is_above: true,
        };
        assert!(oracle_outcome(&above, dec!(100000.01)));
        assert!(!oracle_outcome(&above, dec!(100000)));
        assert!(!oracle_outcome(&above, dec!(99999.99)));

        let below = OracleConfig { is_above: false, ..above };
        assert!(oracle_outcome(&below, dec!(99999.99)));
        assert!(!oracle_outcome(&below, dec!(100000)));
        assert!(!oracle_outcome(&below, dec!(100000.01)));
    }
}
