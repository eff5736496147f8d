//! Position Ledger View - Partition a user's positions into UI buckets
//!
//! Pure filters over one consistent snapshot of (position, market) pairs.
//! Nothing here is cached: the buckets are recomputed on every refresh so
//! they can never go stale relative to their source snapshot.

use crate::pricing;
use crate::types::{Market, Position};

/// A position joined with its market, when the market has loaded.
///
/// The market fetch can fail independently of the position fetch; a
/// position without its market is never assumed to be a winner.
#[derive(Debug, Clone)]
pub struct PositionWithMarket {
    pub position: Position,
    pub market: Option<Market>,
}

impl PositionWithMarket {
    /// Market not yet settled (or not yet loaded).
    pub fn is_active(&self) -> bool {
        self.market.as_ref().map(|m| !m.settled).unwrap_or(true)
    }

    /// Settled, won, and not yet claimed.
    pub fn is_claimable(&self) -> bool {
        match &self.market {
            Some(m) => m.settled && !self.position.claimed && m.outcome == Some(self.position.is_yes),
            None => false,
        }
    }

    /// Settled on the position's side, claimed or not.
    pub fn is_settled_won(&self) -> bool {
        match &self.market {
            Some(m) => m.settled && m.outcome == Some(self.position.is_yes),
            None => false,
        }
    }

    /// Settled against the position's side.
    pub fn is_settled_lost(&self) -> bool {
        match &self.market {
            Some(m) => m.settled && m.outcome.is_some() && m.outcome != Some(self.position.is_yes),
            None => false,
        }
    }

    /// Winnings owed if this position is claimable, in Octas.
    pub fn claimable_payout(&self) -> u64 {
        match &self.market {
            Some(market) if self.is_claimable() => pricing::payout(
                self.position.amount,
                market.total_yes_stake,
                market.total_no_stake,
                self.position.is_yes,
            ),
            _ => 0,
        }
    }
}

/// The four derived views over one snapshot.
#[derive(Debug, Clone, Default)]
pub struct PositionBuckets {
    pub active: Vec<PositionWithMarket>,
    pub claimable: Vec<PositionWithMarket>,
    pub settled_won: Vec<PositionWithMarket>,
    pub settled_lost: Vec<PositionWithMarket>,
}

/// Partition a snapshot into the four buckets.
///
/// `settled_won` includes claimed positions; `claimable` is the unclaimed
/// subset of it.
pub fn partition(snapshot: &[PositionWithMarket]) -> PositionBuckets {
    let mut buckets = PositionBuckets::default();
    for entry in snapshot {
        if entry.is_active() {
            buckets.active.push(entry.clone());
        }
        if entry.is_claimable() {
            buckets.claimable.push(entry.clone());
        }
        if entry.is_settled_won() {
            buckets.settled_won.push(entry.clone());
        }
        if entry.is_settled_lost() {
            buckets.settled_lost.push(entry.clone());
        }
    }
    buckets
}

/// Preview of total claimable winnings across a snapshot, in Octas.
///
/// Display quantity only: computed from the client-side market snapshots
/// before any claim executes. The ledger fixed the authoritative amounts at
/// settlement time.
pub fn claimable_total(snapshot: &[PositionWithMarket]) -> u64 {
    snapshot
        .iter()
        .map(PositionWithMarket::claimable_payout)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn market(id: u64, settled: bool, outcome: Option<bool>) -> Market {
        Market {
            id,
            question: format!("market {id}"),
            category: Category::Sports,
            resolution_time: 100,
            total_yes_stake: 600_000_000,
            total_no_stake: 400_000_000,
            outcome,
            settled,
            creator: "0xabc".to_string(),
            created_at: 0,
            oracle_config: None,
        }
    }

    fn entry(
        id: u64,
        is_yes: bool,
        claimed: bool,
        market: Option<Market>,
    ) -> PositionWithMarket {
        PositionWithMarket {
            position: Position {
                id,
                market_id: market.as_ref().map(|m| m.id).unwrap_or(0),
                user: "0xuser".to_string(),
                is_yes,
                amount: 100_000_000,
                created_at: 0,
                claimed,
            },
            market,
        }
    }

    #[test]
    fn partition_buckets_are_disjoint_where_required() {
        let snapshot = vec![
            entry(1, true, false, Some(market(10, false, None))), // active
            entry(2, true, false, Some(market(11, true, Some(true)))), // claimable + won
            entry(3, true, true, Some(market(12, true, Some(true)))), // won, claimed
            entry(4, false, false, Some(market(13, true, Some(true)))), // lost
            entry(5, true, false, None),                          // market not loaded
        ];
        let buckets = partition(&snapshot);

        assert_eq!(
            buckets.active.iter().map(|e| e.position.id).collect::<Vec<_>>(),
            vec![1, 5]
        );
        assert_eq!(
            buckets.claimable.iter().map(|e| e.position.id).collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(
            buckets.settled_won.iter().map(|e| e.position.id).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(
            buckets.settled_lost.iter().map(|e| e.position.id).collect::<Vec<_>>(),
            vec![4]
        );
    }

    #[test]
    fn claimable_never_includes_unsettled_claimed_or_losing() {
        let snapshot = vec![
            entry(1, true, false, Some(market(10, false, None))),
            entry(2, true, true, Some(market(11, true, Some(true)))),
            entry(3, false, false, Some(market(12, true, Some(true)))),
            entry(4, true, false, None),
        ];
        assert!(partition(&snapshot).claimable.is_empty());
    }

    #[test]
    fn unloaded_market_is_conservatively_active_only() {
        let e = entry(9, true, false, None);
        assert!(e.is_active());
        assert!(!e.is_claimable());
        assert!(!e.is_settled_won());
        assert!(!e.is_settled_lost());
    }

    #[test]
    fn claimable_total_sums_pool_payouts() {
        // 100M YES into a 600M/400M pool pays 166_666_666 each.
        let snapshot = vec![
            entry(1, true, false, Some(market(10, true, Some(true)))),
            entry(2, true, false, Some(market(11, true, Some(true)))),
            entry(3, false, false, Some(market(12, true, Some(true)))), // loser, excluded
        ];
        assert_eq!(claimable_total(&snapshot), 2 * 166_666_666);
    }

    #[test]
    fn claimable_total_empty_winning_pool_previews_zero() {
        let mut m = market(10, true, Some(false));
        m.total_no_stake = 0; // NO won but nobody staked NO
        let snapshot = vec![entry(1, false, false, Some(m))];
        assert_eq!(claimable_total(&snapshot), 0);
    }
}
