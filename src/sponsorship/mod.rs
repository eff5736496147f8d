//! Gas Station integration - sponsored (gasless) transactions
//!
//! A third party pays fees for a fixed allow-list of user actions. The
//! station is optional: without an API key nothing is sponsored, and a
//! sponsorship failure always falls back to unsponsored submission.

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GAS_STATION_URL: &str = "https://api.shinami.com/aptos/gas/v1";

/// Entry functions eligible for sponsorship. Core user actions plus
/// onboarding and growth flows; settlement and admin actions pay their own
/// gas.
pub const SPONSORED_FUNCTIONS: [&str; 4] = [
    "::position::place_bet",
    "::position::claim_winnings",
    "::bonus::claim_welcome_bonus",
    "::referral::register_referral",
];

#[derive(Debug, Error)]
pub enum SponsorshipError {
    #[error("gas station transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gas station rejected the transaction: {0}")]
    Rejected(String),

    #[error("unexpected gas station response: {0}")]
    Malformed(String),
}

/// JSON-RPC client for the gas station.
pub struct GasStation {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GasStation {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Whether this function is on the sponsor allow-list.
    pub fn should_sponsor(&self, function: &str) -> bool {
        SPONSORED_FUNCTIONS
            .iter()
            .any(|pattern| function.contains(pattern))
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, SponsorshipError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let payload: Value = response.json().await?;
        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("sponsorship failed");
            return Err(SponsorshipError::Rejected(message.to_string()));
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| SponsorshipError::Malformed("missing result".to_string()))
    }

    /// Sponsor a signed transaction. Returns the fee-payer wrapped
    /// transaction ready for submission.
    pub async fn sponsor_transaction(
        &self,
        sender: &str,
        transaction: &[u8],
    ) -> Result<Vec<u8>, SponsorshipError> {
        let result = self
            .rpc(
                "gas_sponsorTransaction",
                json!({
                    "sender": sender,
                    "transaction": format!("0x{}", hex::encode(transaction)),
                }),
            )
            .await?;

        let raw = result
            .get("rawTransaction")
            .and_then(Value::as_str)
            .ok_or_else(|| SponsorshipError::Malformed("missing rawTransaction".to_string()))?;
        hex::decode(raw.trim_start_matches("0x"))
            .map_err(|e| SponsorshipError::Malformed(format!("bad rawTransaction hex: {e}")))
    }

    /// Status of a sponsored transaction: IN_FLIGHT, INVALID, or COMPLETE.
    pub async fn sponsorship_status(&self, hash: &str) -> Result<String, SponsorshipError> {
        let result = self
            .rpc(
                "gas_getSponsoredTransactionStatus",
                json!({ "transactionHash": hash }),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SponsorshipError::Malformed("missing status".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_matches_qualified_names() {
        let station = GasStation::new(DEFAULT_GAS_STATION_URL, "key");
        assert!(station.should_sponsor("0x78a3::position::place_bet"));
        assert!(station.should_sponsor("0x78a3::position::claim_winnings"));
        assert!(station.should_sponsor("0x78a3::bonus::claim_welcome_bonus"));
        assert!(station.should_sponsor("0x78a3::referral::register_referral"));
    }

    #[test]
    fn allow_list_excludes_settlement_and_admin() {
        let station = GasStation::new(DEFAULT_GAS_STATION_URL, "key");
        assert!(!station.should_sponsor("0x78a3::market::resolve_market_with_oracle"));
        assert!(!station.should_sponsor("0x78a3::market::create_market"));
        assert!(!station.should_sponsor("0x78a3::treasury::withdraw"));
    }
}
