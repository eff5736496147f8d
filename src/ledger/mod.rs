//! Ledger boundary - view queries and transaction submission
//!
//! The chain is the single source of truth for balances and settlement
//! finality; everything in this crate reasons against it through the
//! [`Ledger`] trait. Production uses [`RestLedger`] against a fullnode;
//! tests substitute doubles.

pub mod errors;
pub mod queries;
pub mod rest;
pub mod signer;
pub mod wire;

pub use errors::LedgerError;
pub use queries::PulseClient;
pub use rest::RestLedger;
pub use signer::RemoteSigner;

use async_trait::async_trait;
use serde_json::Value;

/// Result of a submitted transaction once the ledger has executed it.
///
/// On-chain rejections are not transport errors: `success` is false and
/// `vm_status` carries the abort information for the error table.
#[derive(Debug, Clone)]
pub struct TxnOutcome {
    pub success: bool,
    pub transaction_hash: String,
    pub vm_status: String,
}

impl TxnOutcome {
    /// Abort code from the vm status, if one is present.
    pub fn abort_code(&self) -> Option<u64> {
        errors::extract_abort_code(&self.vm_status)
    }

    /// User-facing translation of the vm status.
    pub fn user_message(&self) -> String {
        errors::parse_vm_status(&self.vm_status)
    }
}

/// Read and write access to the deployed Pulse modules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Read-only call against a deployed view function. Returns the raw
    /// array of return values as rendered by the fullnode.
    async fn view(&self, function: &str, args: Vec<Value>) -> Result<Value, LedgerError>;

    /// Sign, optionally sponsor, submit, and await execution of an entry
    /// function call from the configured sender.
    async fn submit(&self, function: &str, args: Vec<Value>) -> Result<TxnOutcome, LedgerError>;
}

/// Wallet custody seam. Signing lives outside this crate; deployments
/// plug in whatever holds the key material.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sender address the signatures are for.
    fn sender_address(&self) -> &str;

    /// Sign an entry function call and return the encoded signed
    /// transaction ready for submission.
    async fn sign_transaction(
        &self,
        function: &str,
        args: &[Value],
    ) -> Result<Vec<u8>, LedgerError>;
}
