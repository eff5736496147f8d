//! Resolution Worker
//!
//! Polls for markets whose resolution time has passed and proposes their
//! settlement to the ledger with verifiable oracle evidence attached. The
//! worker never resolves anything itself: the ledger re-verifies the price
//! payload and enforces the exactly-once transition. One cycle is in
//! flight at a time; a shutdown request lets the current cycle finish.

use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::ledger::{errors, Ledger, LedgerError, PulseClient};
use crate::market;
use crate::oracle::{feeds, OracleError, PriceFeed};
use crate::types::Market;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Why one candidate could not be resolved this cycle. Every variant is
/// retryable: the candidate is picked up again on the next poll.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("market {0} has no oracle config")]
    NoOracleConfig(u64),

    #[error("no price available for feed {0}")]
    PriceUnavailable(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Genuine on-chain rejection, translated for the log.
    #[error("settlement rejected: {0}")]
    Rejected(String),
}

/// Tally of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub candidates: usize,
    pub settled: usize,
    pub failed: usize,
}

pub struct ResolutionWorker<L, F> {
    client: PulseClient<L>,
    feed: F,
    poll_interval: Duration,
}

impl<L: Ledger, F: PriceFeed> ResolutionWorker<L, F> {
    pub fn new(client: PulseClient<L>, feed: F, poll_interval: Duration) -> Self {
        Self {
            client,
            feed,
            poll_interval,
        }
    }

    /// Markets eligible for automatic resolution right now: resolution
    /// time passed, not settled, and carrying an oracle config. Manual
    /// markets are never touched by this worker.
    async fn pending_candidates(&self, now: i64) -> Result<Vec<Market>, LedgerError> {
        let markets = self.client.active_markets().await?;
        Ok(markets
            .into_iter()
            .filter(|m| market::is_pending_resolution(m, now) && m.oracle_config.is_some())
            .collect())
    }

    /// Resolve a single candidate: fetch the price, compute the proposed
    /// outcome, and submit it with the verifiable update payload. Without
    /// price evidence no settlement is attempted.
    async fn resolve_market(&self, candidate: &Market) -> Result<(), ResolveError> {
        let config = candidate
            .oracle_config
            .as_ref()
            .ok_or(ResolveError::NoOracleConfig(candidate.id))?;

        let feed_ids = [config.feed_id.clone()];
        let prices = self.feed.latest_prices(&feed_ids).await?;
        let quote = feeds::feed_id_to_symbol(&config.feed_id)
            .and_then(|symbol| prices.get(symbol))
            .ok_or_else(|| ResolveError::PriceUnavailable(config.feed_id.to_string()))?;

        let outcome = market::oracle_outcome(config, quote.price);
        let payload = self.feed.price_update_data(&feed_ids).await?;
        let payload_hex: Vec<String> = payload
            .iter()
            .map(|chunk| format!("0x{}", hex::encode(chunk)))
            .collect();

        debug!(
            market_id = candidate.id,
            price = %quote.price,
            threshold = %config.threshold,
            is_above = config.is_above,
            outcome,
            "proposing resolution"
        );

        let function = self.client.function_id("market", "resolve_market_with_oracle");
        let result = self
            .client
            .ledger()
            .submit(
                &function,
                vec![
                    json!(candidate.id.to_string()),
                    json!(outcome),
                    json!(payload_hex),
                ],
            )
            .await?;

        if result.success {
            info!(
                market_id = candidate.id,
                outcome,
                hash = %result.transaction_hash,
                "market resolved"
            );
            return Ok(());
        }

        // A racing resolver (or our own retry) got there first. The market
        // is in the terminal state we wanted: success.
        if errors::is_already_settled(&result.vm_status) {
            debug!(market_id = candidate.id, "already settled elsewhere");
            return Ok(());
        }

        Err(ResolveError::Rejected(result.user_message()))
    }

    /// One full poll cycle. Candidate failures are isolated: each is
    /// logged and left for the next cycle, never aborting the rest.
    pub async fn run_cycle(&self, now: i64) -> Result<CycleReport, LedgerError> {
        let candidates = self.pending_candidates(now).await?;
        let mut report = CycleReport {
            candidates: candidates.len(),
            ..CycleReport::default()
        };

        if candidates.is_empty() {
            debug!("no markets pending resolution");
            return Ok(report);
        }
        info!(count = candidates.len(), "markets pending resolution");

        for candidate in &candidates {
            match self.resolve_market(candidate).await {
                Ok(()) => report.settled += 1,
                Err(error) => {
                    report.failed += 1;
                    warn!(
                        market_id = candidate.id,
                        %error,
                        "resolution failed, will retry next cycle"
                    );
                }
            }
        }

        Ok(report)
    }

    /// Poll until shutdown. Cycles never overlap, and shutdown only takes
    /// effect between cycles — an in-flight ledger submission cannot be
    /// recalled, so the current cycle always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "resolution worker started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Utc::now().timestamp();
                    match self.run_cycle(now).await {
                        Ok(report) if report.candidates > 0 => {
                            info!(
                                candidates = report.candidates,
                                settled = report.settled,
                                failed = report.failed,
                                "resolution cycle complete"
                            );
                        }
                        Ok(_) => {}
                        Err(error) => {
                            error!(%error, "resolution cycle failed");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender also means shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("resolution worker stopping");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MockLedger, TxnOutcome};
    use crate::oracle::{MockPriceFeed, PriceQuote};
    use crate::types::{Category, FeedId, OracleConfig};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::collections::HashMap;

    const BTC_FEED: &str = "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43";

    fn oracle_market(id: u64, resolution_time: i64) -> Value {
        serde_json::json!({
            "id": id.to_string(),
            "question": format!("market {id}"),
            "category": 0,
            "resolution_time": resolution_time.to_string(),
            "total_yes_stake": "600000000",
            "total_no_stake": "400000000",
            "outcome": { "vec": [] },
            "settled": false,
            "creator": "0xcafe",
            "created_at": "0",
            "oracle_config": { "vec": [{
                "feed_id": format!("0x{BTC_FEED}"),
                "threshold": "10000000000000",
                "is_above": true
            }] }
        })
    }

    fn manual_market(id: u64, resolution_time: i64) -> Value {
        serde_json::json!({
            "id": id.to_string(),
            "question": format!("market {id}"),
            "category": 2,
            "resolution_time": resolution_time.to_string(),
            "total_yes_stake": "0",
            "total_no_stake": "0",
            "outcome": { "vec": [] },
            "settled": false,
            "creator": "0xcafe",
            "created_at": "0",
            "oracle_config": { "vec": [] }
        })
    }

    fn btc_quote(price: rust_decimal::Decimal) -> HashMap<String, PriceQuote> {
        let mut map = HashMap::new();
        map.insert(
            "BTC_USD".to_string(),
            PriceQuote {
                symbol: "BTC_USD".to_string(),
                feed_id: FeedId::from_hex(BTC_FEED),
                price,
                confidence: dec!(10),
                publish_time: 1_754_000_000,
            },
        );
        map
    }

    fn feed_with_price(price: rust_decimal::Decimal) -> MockPriceFeed {
        let mut feed = MockPriceFeed::new();
        feed.expect_latest_prices()
            .returning(move |_| Ok(btc_quote(price)));
        feed.expect_price_update_data()
            .returning(|_| Ok(vec![vec![0x50, 0x4e, 0x41, 0x55]]));
        feed
    }

    fn view_response(markets: Vec<Value>) -> Value {
        serde_json::json!([markets])
    }

    #[tokio::test]
    async fn cycle_resolves_pending_oracle_markets_only() {
        let mut ledger = MockLedger::new();
        ledger.expect_view().returning(|_, _| {
            Ok(view_response(vec![
                oracle_market(1, 100),  // pending, oracle -> resolve
                oracle_market(2, 9_999), // not yet due
                manual_market(3, 100),  // pending but manual -> skip
            ]))
        });
        ledger
            .expect_submit()
            .times(1)
            .withf(|function, args| {
                function.ends_with("::market::resolve_market_with_oracle")
                    && args[0] == serde_json::json!("1")
                    // price 104346.02 above the 100000 threshold -> YES
                    && args[1] == serde_json::json!(true)
            })
            .returning(|_, _| {
                Ok(TxnOutcome {
                    success: true,
                    transaction_hash: "0xhash".to_string(),
                    vm_status: "Executed successfully".to_string(),
                })
            });

        let worker = ResolutionWorker::new(
            PulseClient::new(ledger, "0x78a3"),
            feed_with_price(dec!(104346.02)),
            DEFAULT_POLL_INTERVAL,
        );
        let report = worker.run_cycle(1_000).await.unwrap();
        assert_eq!(
            report,
            CycleReport {
                candidates: 1,
                settled: 1,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn below_threshold_proposes_no() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_view()
            .returning(|_, _| Ok(view_response(vec![oracle_market(1, 100)])));
        ledger
            .expect_submit()
            .times(1)
            .withf(|_, args| args[1] == serde_json::json!(false))
            .returning(|_, _| {
                Ok(TxnOutcome {
                    success: true,
                    transaction_hash: "0xhash".to_string(),
                    vm_status: "Executed successfully".to_string(),
                })
            });

        let worker = ResolutionWorker::new(
            PulseClient::new(ledger, "0x78a3"),
            feed_with_price(dec!(99999.99)),
            DEFAULT_POLL_INTERVAL,
        );
        let report = worker.run_cycle(1_000).await.unwrap();
        assert_eq!(report.settled, 1);
    }

    #[tokio::test]
    async fn price_fetch_failure_isolates_the_candidate() {
        // Three pending markets; the price fetch for the second one fails.
        let mut ledger = MockLedger::new();
        ledger.expect_view().returning(|_, _| {
            Ok(view_response(vec![
                oracle_market(1, 100),
                oracle_market(2, 100),
                oracle_market(3, 100),
            ]))
        });
        ledger.expect_submit().times(2).returning(|_, _| {
            Ok(TxnOutcome {
                success: true,
                transaction_hash: "0xhash".to_string(),
                vm_status: "Executed successfully".to_string(),
            })
        });

        let mut feed = MockPriceFeed::new();
        let mut call = 0;
        feed.expect_latest_prices().returning(move |_| {
            call += 1;
            if call == 2 {
                // second candidate: oracle outage
                Err(OracleError::Malformed("hermes 503".to_string()))
            } else {
                Ok(btc_quote(dec!(104346.02)))
            }
        });
        feed.expect_price_update_data()
            .returning(|_| Ok(vec![vec![0x50]]));

        let worker = ResolutionWorker::new(
            PulseClient::new(ledger, "0x78a3"),
            feed,
            DEFAULT_POLL_INTERVAL,
        );
        let report = worker.run_cycle(1_000).await.unwrap();
        assert_eq!(
            report,
            CycleReport {
                candidates: 3,
                settled: 2,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn already_settled_rejection_is_success() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_view()
            .returning(|_, _| Ok(view_response(vec![oracle_market(1, 100)])));
        ledger.expect_submit().times(1).returning(|_, _| {
            Ok(TxnOutcome {
                success: false,
                transaction_hash: "0xhash".to_string(),
                vm_status: "Move abort in 0x78a3::market: 0x3".to_string(),
            })
        });

        let worker = ResolutionWorker::new(
            PulseClient::new(ledger, "0x78a3"),
            feed_with_price(dec!(104346.02)),
            DEFAULT_POLL_INTERVAL,
        );
        let report = worker.run_cycle(1_000).await.unwrap();
        assert_eq!(report.settled, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn genuine_rejection_counts_as_failure() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_view()
            .returning(|_, _| Ok(view_response(vec![oracle_market(1, 100)])));
        ledger.expect_submit().times(1).returning(|_, _| {
            Ok(TxnOutcome {
                success: false,
                transaction_hash: "0xhash".to_string(),
                vm_status: "Move abort in 0x78a3::market: 0x9".to_string(),
            })
        });

        let worker = ResolutionWorker::new(
            PulseClient::new(ledger, "0x78a3"),
            feed_with_price(dec!(104346.02)),
            DEFAULT_POLL_INTERVAL,
        );
        let report = worker.run_cycle(1_000).await.unwrap();
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn empty_ledger_means_quiet_cycle() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_view()
            .returning(|_, _| Ok(view_response(vec![])));
        let worker = ResolutionWorker::new(
            PulseClient::new(ledger, "0x78a3"),
            MockPriceFeed::new(),
            DEFAULT_POLL_INTERVAL,
        );
        let report = worker.run_cycle(1_000).await.unwrap();
        assert_eq!(report, CycleReport::default());
    }
}
