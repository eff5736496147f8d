//! Batch Claim Orchestrator
//!
//! Claims every claimable position for a user as a sequence of independent
//! ledger transactions. Claims run strictly sequentially: they share one
//! sender account, and ordering the submissions avoids sequence-number
//! races. Do not parallelize this loop.

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ledger::{errors, Ledger, PulseClient};
use crate::positions::PositionWithMarket;

/// Observer-visible batch progress. Advances by one after every attempt,
/// successful or not, so "claiming 3 of 7" keeps moving even when some
/// claims fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimProgress {
    pub current: usize,
    pub total: usize,
}

/// Summary of one batch. The batch produced a user-visible success
/// (celebration) iff any claim landed, even if others failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimResult {
    pub success_count: usize,
    pub attempted_count: usize,
}

impl ClaimResult {
    pub fn celebration(&self) -> bool {
        self.success_count > 0
    }
}

/// Claim all positions in the batch, tolerating partial failure.
///
/// A failed claim is logged and the loop continues; the position stays
/// claimable for a future batch. An "already claimed" rejection is a
/// benign no-op counted as success — a retried batch must not report
/// winnings it already paid as failures.
pub async fn claim_all<L: Ledger>(
    client: &PulseClient<L>,
    claimable: &[PositionWithMarket],
    progress: Option<mpsc::UnboundedSender<ClaimProgress>>,
) -> ClaimResult {
    let total = claimable.len();
    let function = client.function_id("position", "claim_winnings");
    let mut success_count = 0;

    for (index, entry) in claimable.iter().enumerate() {
        let position_id = entry.position.id;
        match client
            .ledger()
            .submit(&function, vec![json!(position_id.to_string())])
            .await
        {
            Ok(outcome) if outcome.success => {
                debug!(position_id, hash = %outcome.transaction_hash, "claimed");
                success_count += 1;
            }
            Ok(outcome) => {
                if errors::is_already_claimed(&outcome.vm_status) {
                    debug!(position_id, "already claimed, treating as success");
                    success_count += 1;
                } else {
                    warn!(
                        position_id,
                        vm_status = %outcome.vm_status,
                        message = %outcome.user_message(),
                        "claim rejected"
                    );
                }
            }
            Err(error) => {
                warn!(position_id, %error, "claim submission failed");
            }
        }

        if let Some(sender) = &progress {
            let _ = sender.send(ClaimProgress {
                current: index + 1,
                total,
            });
        }
    }

    ClaimResult {
        success_count,
        attempted_count: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerError, MockLedger, TxnOutcome};
    use crate::types::{Category, Market, Position};

    fn claimable_entry(position_id: u64) -> PositionWithMarket {
        PositionWithMarket {
            position: Position {
                id: position_id,
                market_id: 1,
                user: "0xuser".to_string(),
                is_yes: true,
                amount: 100_000_000,
                created_at: 0,
                claimed: false,
            },
            market: Some(Market {
                id: 1,
                question: "won market".to_string(),
                category: Category::Sports,
                resolution_time: 100,
                total_yes_stake: 600_000_000,
                total_no_stake: 400_000_000,
                outcome: Some(true),
                settled: true,
                creator: "0xcafe".to_string(),
                created_at: 0,
                oracle_config: None,
            }),
        }
    }

    fn success_outcome() -> TxnOutcome {
        TxnOutcome {
            success: true,
            transaction_hash: "0xhash".to_string(),
            vm_status: "Executed successfully".to_string(),
        }
    }

    #[tokio::test]
    async fn all_claims_succeed() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_submit()
            .times(3)
            .returning(|_, _| Ok(success_outcome()));
        let client = PulseClient::new(ledger, "0x78a3");

        let batch: Vec<_> = (1..=3).map(claimable_entry).collect();
        let result = claim_all(&client, &batch, None).await;
        assert_eq!(
            result,
            ClaimResult {
                success_count: 3,
                attempted_count: 3
            }
        );
        assert!(result.celebration());
    }

    #[tokio::test]
    async fn partial_failure_continues_and_reports() {
        // Positions 2 and 4 of 5 fail; the batch still attempts all 5.
        let mut ledger = MockLedger::new();
        ledger.expect_submit().times(5).returning(|_, args| {
            let id: u64 = args[0].as_str().unwrap().parse().unwrap();
            if id == 2 {
                Err(LedgerError::Malformed("connection reset".to_string()))
            } else if id == 4 {
                Ok(TxnOutcome {
                    success: false,
                    transaction_hash: "0xhash".to_string(),
                    vm_status: "Move abort in 0x78a3::position: 0x68".to_string(),
                })
            } else {
                Ok(success_outcome())
            }
        });
        let client = PulseClient::new(ledger, "0x78a3");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let batch: Vec<_> = (1..=5).map(claimable_entry).collect();
        let result = claim_all(&client, &batch, Some(tx)).await;

        assert_eq!(
            result,
            ClaimResult {
                success_count: 3,
                attempted_count: 5
            }
        );
        assert!(result.celebration());

        // Progress advanced once per attempt and finished at {5, 5}.
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        assert_eq!(updates.len(), 5);
        for (i, update) in updates.iter().enumerate() {
            assert_eq!(update.current, i + 1);
            assert_eq!(update.total, 5);
        }
        assert_eq!(updates.last(), Some(&ClaimProgress { current: 5, total: 5 }));
    }

    #[tokio::test]
    async fn already_claimed_is_a_benign_success() {
        let mut ledger = MockLedger::new();
        ledger.expect_submit().times(1).returning(|_, _| {
            Ok(TxnOutcome {
                success: false,
                transaction_hash: "0xhash".to_string(),
                vm_status: "Move abort in 0x78a3::position: 0x66".to_string(),
            })
        });
        let client = PulseClient::new(ledger, "0x78a3");

        let batch = vec![claimable_entry(1)];
        let result = claim_all(&client, &batch, None).await;
        assert_eq!(result.success_count, 1);
    }

    #[tokio::test]
    async fn zero_success_batch_yields_no_celebration() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_submit()
            .times(2)
            .returning(|_, _| Err(LedgerError::Malformed("node down".to_string())));
        let client = PulseClient::new(ledger, "0x78a3");

        let batch: Vec<_> = (1..=2).map(claimable_entry).collect();
        let result = claim_all(&client, &batch, None).await;
        assert_eq!(result.success_count, 0);
        assert!(!result.celebration());
    }

    #[tokio::test]
    async fn empty_batch_is_a_quiet_no_op() {
        let ledger = MockLedger::new();
        let client = PulseClient::new(ledger, "0x78a3");
        let result = claim_all(&client, &[], None).await;
        assert_eq!(result.attempted_count, 0);
        assert!(!result.celebration());
    }
}
