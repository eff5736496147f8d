//! Fullnode REST client
//!
//! HTTP implementation of the [`Ledger`] trait against a Movement/Aptos
//! style fullnode. View calls are plain JSON; submissions take the signed
//! payload from the [`TransactionSigner`] seam, run it through the optional
//! gas station, and poll the transaction endpoint until execution.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{errors::LedgerError, Ledger, TransactionSigner, TxnOutcome};
use crate::sponsorship::GasStation;

const SIGNED_TXN_CONTENT_TYPE: &str = "application/x.aptos.signed_transaction+bcs";
const CONFIRMATION_POLL_MS: u64 = 500;

/// REST client for the fullnode API.
pub struct RestLedger {
    client: Client,
    base_url: String,
    signer: Arc<dyn TransactionSigner>,
    gas_station: Option<GasStation>,
    /// How long to wait for a submitted transaction to execute.
    confirmation_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TxnStatusResponse {
    #[serde(rename = "type")]
    txn_type: Option<String>,
    hash: String,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    vm_status: String,
}

impl RestLedger {
    pub fn new(
        base_url: &str,
        signer: Arc<dyn TransactionSigner>,
        gas_station: Option<GasStation>,
        confirmation_timeout: Duration,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
            gas_station,
            confirmation_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Run the signed payload through the gas station when the target
    /// function is sponsor-eligible. Sponsorship failure falls back to the
    /// unsponsored payload; the user action is never blocked on it.
    async fn maybe_sponsor(&self, function: &str, signed: Vec<u8>) -> Vec<u8> {
        let Some(station) = &self.gas_station else {
            return signed;
        };
        if !station.should_sponsor(function) {
            return signed;
        }
        match station
            .sponsor_transaction(self.signer.sender_address(), &signed)
            .await
        {
            Ok(sponsored) => {
                debug!(function, "transaction sponsored");
                sponsored
            }
            Err(error) => {
                warn!(function, %error, "sponsorship failed, submitting unsponsored");
                signed
            }
        }
    }

    /// Poll the transaction endpoint until the ledger reports execution.
    async fn wait_for_transaction(&self, hash: &str) -> Result<TxnOutcome, LedgerError> {
        let deadline = tokio::time::Instant::now() + self.confirmation_timeout;
        loop {
            let response = self
                .client
                .get(self.url(&format!("transactions/by_hash/{hash}")))
                .send()
                .await?;

            if response.status().is_success() {
                let status: TxnStatusResponse = response.json().await?;
                // Pending transactions echo back without a vm_status.
                if status.txn_type.as_deref() != Some("pending_transaction") {
                    return Ok(TxnOutcome {
                        success: status.success,
                        transaction_hash: status.hash,
                        vm_status: status.vm_status,
                    });
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(LedgerError::ConfirmationTimeout {
                    hash: hash.to_string(),
                });
            }
            tokio::time::sleep(Duration::from_millis(CONFIRMATION_POLL_MS)).await;
        }
    }
}

#[async_trait]
impl Ledger for RestLedger {
    async fn view(&self, function: &str, args: Vec<Value>) -> Result<Value, LedgerError> {
        let body = json!({
            "function": function,
            "type_arguments": [],
            "arguments": args,
        });

        let response = self
            .client
            .post(self.url("view"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(LedgerError::Malformed(format!(
                "view {function} returned {status}: {detail}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn submit(&self, function: &str, args: Vec<Value>) -> Result<TxnOutcome, LedgerError> {
        let signed = self.signer.sign_transaction(function, &args).await?;
        let payload = self.maybe_sponsor(function, signed).await;

        let response = self
            .client
            .post(self.url("transactions"))
            .header(CONTENT_TYPE, SIGNED_TXN_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(LedgerError::Malformed(format!(
                "submit {function} returned {status}: {detail}"
            )));
        }

        let pending: TxnStatusResponse = response.json().await?;
        debug!(function, hash = %pending.hash, "transaction submitted");
        self.wait_for_transaction(&pending.hash).await
    }
}
