//! Pool Pricing Engine - Pari-mutuel odds and payouts
//!
//! Pure integer math over the two stake totals of a binary pool. The bet
//! preview on the client and the payout accounting on the settlement path
//! both call into these functions and must agree bit-for-bit, so nothing
//! here touches I/O, floats, or clocks.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Payout multiplier assumed for a side nobody has staked yet. A fresh
/// 50/50 market pays out at 2x, so an empty side quotes the same.
const EMPTY_SIDE_MULTIPLIER: Decimal = dec!(2);

/// Implied odds of a pool as whole percentages.
///
/// The pair always sums to exactly 100. An empty pool is quoted 50/50.
pub fn implied_odds(total_yes: u64, total_no: u64) -> (u32, u32) {
    let total = total_yes as u128 + total_no as u128;
    if total == 0 {
        return (50, 50);
    }
    // round(100 * yes / total), then derive NO from the remainder so the
    // invariant yes + no == 100 holds under any rounding.
    let yes = ((total_yes as u128 * 100 + total / 2) / total) as u32;
    (yes, 100 - yes)
}

/// Payout multiplier for one side of the pool: total pool over side total.
pub fn multiplier(total_yes: u64, total_no: u64, is_yes: bool) -> Decimal {
    let side_total = if is_yes { total_yes } else { total_no };
    if side_total == 0 {
        return EMPTY_SIDE_MULTIPLIER;
    }
    let total = Decimal::from(total_yes) + Decimal::from(total_no);
    total / Decimal::from(side_total)
}

/// Pro-rata pari-mutuel payout for a winning stake, in Octas.
///
/// `stake * (total_yes + total_no) / winning_side_total`, truncated to the
/// smallest unit. A zero winning-side pool pays 0 rather than dividing by
/// zero; whether the ledger can produce such a market at all is its own
/// invariant. Intermediates are u128, exact for stakes and pools well past
/// 10^12 Octas.
pub fn payout(stake: u64, total_yes: u64, total_no: u64, is_yes: bool) -> u64 {
    let winning_side = if is_yes { total_yes } else { total_no };
    if winning_side == 0 {
        return 0;
    }
    let total = total_yes as u128 + total_no as u128;
    (stake as u128 * total / winning_side as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odds_sum_to_one_hundred() {
        let cases = [
            (0u64, 0u64),
            (1, 0),
            (0, 1),
            (600_000_000, 400_000_000),
            (1, 2),
            (2, 1),
            (333, 667),
            (1_000_000_000_000, 1),
            (1, 1_000_000_000_000),
            (7, 13),
        ];
        for (yes, no) in cases {
            let (y, n) = implied_odds(yes, no);
            assert_eq!(y + n, 100, "odds for ({yes}, {no}) must sum to 100");
            assert!(y <= 100 && n <= 100);
        }
    }

    #[test]
    fn odds_empty_pool_is_even() {
        assert_eq!(implied_odds(0, 0), (50, 50));
    }

    #[test]
    fn odds_sixty_forty() {
        assert_eq!(implied_odds(600_000_000, 400_000_000), (60, 40));
    }

    #[test]
    fn multiplier_balanced_pool_is_two() {
        assert_eq!(multiplier(500, 500, true), Decimal::from(2));
        assert_eq!(multiplier(500, 500, false), Decimal::from(2));
    }

    #[test]
    fn multiplier_empty_side_defaults_to_two() {
        assert_eq!(multiplier(0, 400, true), Decimal::from(2));
        assert_eq!(multiplier(400, 0, false), Decimal::from(2));
    }

    #[test]
    fn multiplier_skewed_pool() {
        // 600/400 pool: YES pays 1000/600, NO pays 1000/400.
        assert_eq!(
            multiplier(600, 400, true),
            Decimal::from(1000) / Decimal::from(600)
        );
        assert_eq!(
            multiplier(600, 400, false),
            Decimal::from(1000) / Decimal::from(400)
        );
    }

    #[test]
    fn payout_balanced_pool_doubles_stake() {
        let stake = 250_000_000;
        let t = 600_000_000;
        assert_eq!(payout(stake, t, t, true), stake * 2);
        assert_eq!(payout(stake, t, t, false), stake * 2);
    }

    #[test]
    fn payout_skewed_pool() {
        // 600M YES / 400M NO pool, 100M YES stake previews 166_666_666.
        assert_eq!(
            payout(100_000_000, 600_000_000, 400_000_000, true),
            166_666_666
        );
    }

    #[test]
    fn payout_empty_winning_side_is_zero() {
        assert_eq!(payout(100_000_000, 600_000_000, 0, false), 0);
        assert_eq!(payout(100_000_000, 0, 600_000_000, true), 0);
    }

    #[test]
    fn payout_never_negative_and_no_precision_loss_at_scale() {
        // Largest realistic stake x pool ratio: 10^12 Octas on both sides.
        let big = 1_000_000_000_000u64;
        assert_eq!(payout(big, big, big, true), big * 2);
        // Sole winning-side staker takes the whole pool, exactly.
        assert_eq!(payout(big, big, 1, true), big + 1);
    }

    #[test]
    fn payout_truncates_toward_zero() {
        // 1 * 3 / 2 = 1.5 -> 1
        assert_eq!(payout(1, 2, 1, true), 1);
    }
}
