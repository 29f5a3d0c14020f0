//! Typed views of the node API the wallet consumes.
//!
//! The node owns these shapes; the wallet only deserializes the fields it
//! needs. Ledger-object fields keep the node's PascalCase names.

use serde::Deserialize;

/// `account_info` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfoResult {
    pub account_data: AccountData,
}

/// The ledger's view of one account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    /// Native balance in drops, as a decimal string.
    #[serde(rename = "Balance")]
    pub balance: String,
    /// Sequence number the ledger expects on this account's next
    /// transaction.
    #[serde(rename = "Sequence")]
    pub sequence: u32,
}

/// `fee` response.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeResult {
    pub drops: FeeDrops,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeDrops {
    /// Current base fee in drops, as a decimal string.
    pub base_fee: String,
}

/// `submit` response: the node's provisional verdict on a signed blob.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResult {
    pub engine_result: String,
}

/// `tx` response: the definitive fate of a submitted transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TxStatusResult {
    #[serde(default)]
    pub validated: bool,
    pub meta: TxMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxMeta {
    #[serde(rename = "TransactionResult")]
    pub transaction_result: String,
}

/// `ledger` response (validated ledger query).
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerResult {
    pub ledger: LedgerHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerHeader {
    pub ledger_index: u64,
}

/// Result code the ledger assigns to a successfully applied transaction.
pub const RESULT_SUCCESS: &str = "tesSUCCESS";
