//! Contract error taxonomy
//!
//! Abort codes raised by the deployed Pulse modules, grouped by owning
//! module, and the parsing of fullnode `vm_status` strings into them. The
//! code-to-message table is part of the public contract: client-side
//! preview validation and server-side error translation must agree on it.

use thiserror::Error;

// Market module (0-99)
pub const ABORT_MARKET_NOT_AUTHORIZED: u64 = 1;
pub const ABORT_MARKET_NOT_FOUND: u64 = 2;
pub const ABORT_MARKET_ALREADY_SETTLED: u64 = 3;
pub const ABORT_MARKET_NOT_SETTLED: u64 = 4;
pub const ABORT_MARKET_INVALID_CATEGORY: u64 = 5;
pub const ABORT_MARKET_EXPIRED: u64 = 6;
pub const ABORT_MARKET_ALREADY_INITIALIZED: u64 = 8;
pub const ABORT_MARKET_NO_ORACLE_CONFIG: u64 = 9;
pub const ABORT_MARKET_NOT_EXPIRED: u64 = 10;

// Position module (100-199)
pub const ABORT_POSITION_NOT_FOUND: u64 = 101;
pub const ABORT_POSITION_ALREADY_CLAIMED: u64 = 102;
pub const ABORT_POSITION_MARKET_NOT_SETTLED: u64 = 103;
pub const ABORT_POSITION_NOT_WINNER: u64 = 104;
pub const ABORT_POSITION_BET_TOO_SMALL: u64 = 106;
pub const ABORT_POSITION_BET_TOO_LARGE: u64 = 107;
pub const ABORT_POSITION_MARKET_EXPIRED: u64 = 108;
pub const ABORT_POSITION_NOT_OWNER: u64 = 109;
pub const ABORT_POSITION_ALREADY_INITIALIZED: u64 = 110;

// Treasury module (200-299)
pub const ABORT_TREASURY_NOT_AUTHORIZED: u64 = 201;
pub const ABORT_TREASURY_INSUFFICIENT_BALANCE: u64 = 202;
pub const ABORT_TREASURY_INVALID_FEE: u64 = 203;
pub const ABORT_TREASURY_ALREADY_INITIALIZED: u64 = 204;
pub const ABORT_TREASURY_NOT_INITIALIZED: u64 = 205;

// Bonus module (300-399)
pub const ABORT_BONUS_NOT_AUTHORIZED: u64 = 301;
pub const ABORT_BONUS_ALREADY_CLAIMED: u64 = 302;
pub const ABORT_BONUS_INSUFFICIENT_BALANCE: u64 = 303;
pub const ABORT_BONUS_ALREADY_INITIALIZED: u64 = 304;

/// User-facing message for a known abort code.
pub fn message_for_code(code: u64) -> Option<&'static str> {
    let message = match code {
        ABORT_MARKET_NOT_AUTHORIZED => "You don't have permission to perform this action",
        ABORT_MARKET_NOT_FOUND => "Market not found",
        ABORT_MARKET_ALREADY_SETTLED => "Market has already been settled",
        ABORT_MARKET_NOT_SETTLED => "Market has not been settled yet",
        ABORT_MARKET_INVALID_CATEGORY => "Invalid category",
        ABORT_MARKET_EXPIRED => "Market has expired",
        ABORT_MARKET_ALREADY_INITIALIZED => "Already initialized",
        ABORT_MARKET_NO_ORACLE_CONFIG => "No oracle configuration found",
        ABORT_MARKET_NOT_EXPIRED => "Market has not expired yet",
        ABORT_POSITION_NOT_FOUND => "Position not found",
        ABORT_POSITION_ALREADY_CLAIMED => "Winnings already claimed",
        ABORT_POSITION_MARKET_NOT_SETTLED => "Market has not been settled yet",
        ABORT_POSITION_NOT_WINNER => "You did not win this bet",
        ABORT_POSITION_BET_TOO_SMALL => "Bet amount too small (minimum $0.10)",
        ABORT_POSITION_BET_TOO_LARGE => "Bet amount too large (maximum $10)",
        ABORT_POSITION_MARKET_EXPIRED => "Market has expired - no more bets allowed",
        ABORT_POSITION_NOT_OWNER => "You don't own this position",
        ABORT_POSITION_ALREADY_INITIALIZED => "Already initialized",
        ABORT_TREASURY_NOT_AUTHORIZED => "You don't have permission to perform this action",
        ABORT_TREASURY_INSUFFICIENT_BALANCE => "Insufficient treasury balance",
        ABORT_TREASURY_INVALID_FEE => "Invalid fee percentage",
        ABORT_TREASURY_ALREADY_INITIALIZED => "Already initialized",
        ABORT_TREASURY_NOT_INITIALIZED => "Treasury not initialized",
        ABORT_BONUS_NOT_AUTHORIZED => "You don't have permission to perform this action",
        ABORT_BONUS_ALREADY_CLAIMED => "Welcome bonus already claimed",
        ABORT_BONUS_INSUFFICIENT_BALANCE => "Insufficient bonus balance",
        ABORT_BONUS_ALREADY_INITIALIZED => "Already initialized",
        _ => return None,
    };
    Some(message)
}

/// Extract the abort code from a `vm_status` string.
///
/// Handles both the trailing-hex form ("Move abort in 0x...::market: 0x6")
/// and the decimal form ("... abort code: 6").
pub fn extract_abort_code(vm_status: &str) -> Option<u64> {
    let trimmed = vm_status.trim_end();
    if let Some(idx) = trimmed.rfind("0x") {
        let hex = &trimmed[idx + 2..];
        if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Ok(code) = u64::from_str_radix(hex, 16) {
                return Some(code);
            }
        }
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(idx) = lower.find("abort code:") {
        let rest = lower[idx + "abort code:".len()..].trim_start();
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(code) = digits.parse::<u64>() {
            return Some(code);
        }
    }

    None
}

/// Translate a `vm_status` into a user-facing message.
///
/// Unrecognized codes and statuses degrade to a generic failure message;
/// this function never fails.
pub fn parse_vm_status(vm_status: &str) -> String {
    if vm_status == "Executed successfully" {
        return "Transaction successful".to_string();
    }

    if let Some(code) = extract_abort_code(vm_status) {
        return match message_for_code(code) {
            Some(message) => message.to_string(),
            None => format!("Unknown error (code: {code})"),
        };
    }

    if vm_status.contains("INSUFFICIENT_BALANCE") {
        return "Insufficient balance for this transaction".to_string();
    }
    if vm_status.contains("OUT_OF_GAS") {
        return "Transaction ran out of gas".to_string();
    }
    if vm_status.contains("SEQUENCE_NUMBER") {
        return "Transaction sequence error - please try again".to_string();
    }

    "Transaction failed. Please try again.".to_string()
}

/// Rejection for a market that is already in its terminal state. Benign for
/// any caller retrying a settle.
pub fn is_already_settled(vm_status: &str) -> bool {
    extract_abort_code(vm_status) == Some(ABORT_MARKET_ALREADY_SETTLED)
}

/// Rejection for winnings that were already paid out. Benign for any caller
/// retrying a claim.
pub fn is_already_claimed(vm_status: &str) -> bool {
    extract_abort_code(vm_status) == Some(ABORT_POSITION_ALREADY_CLAIMED)
}

/// Transport and decoding failures at the ledger boundary. On-chain
/// rejections are not errors at this level; they surface as an unsuccessful
/// [`TxnOutcome`](super::TxnOutcome) with a parseable `vm_status`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("transaction signing failed: {0}")]
    Signing(String),

    #[error("timed out waiting for transaction {hash}")]
    ConfirmationTimeout { hash: String },

    #[error("unexpected ledger response: {0}")]
    Malformed(String),
}
