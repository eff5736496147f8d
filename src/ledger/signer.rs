//! Remote signing service client
//!
//! Wallet custody is an external collaborator: a signing sidecar holds the
//! resolver key material and returns encoded signed transactions. This
//! process never sees a private key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{errors::LedgerError, TransactionSigner};

/// HTTP client for the signing sidecar.
pub struct RemoteSigner {
    client: Client,
    base_url: String,
    sender: String,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signed_transaction: String,
}

impl RemoteSigner {
    pub fn new(base_url: &str, sender: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl TransactionSigner for RemoteSigner {
    fn sender_address(&self) -> &str {
        &self.sender
    }

    async fn sign_transaction(
        &self,
        function: &str,
        args: &[Value],
    ) -> Result<Vec<u8>, LedgerError> {
        let body = json!({
            "sender": self.sender,
            "function": function,
            "type_arguments": [],
            "arguments": args,
        });

        let response = self
            .client
            .post(format!("{}/sign", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(LedgerError::Signing(format!(
                "signer returned {status}: {detail}"
            )));
        }

        let signed: SignResponse = response.json().await?;
        hex::decode(signed.signed_transaction.trim_start_matches("0x"))
            .map_err(|e| LedgerError::Signing(format!("bad signed transaction hex: {e}")))
    }
}
