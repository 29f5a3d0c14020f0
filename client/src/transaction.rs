//! Unsigned transaction shapes.
//!
//! Builders produce the JSON the node expects. Ledger-determined fields
//! (`Fee`, `Sequence`) are absent until autofill adds them; the signer
//! appends `SigningPubKey` and `TxnSignature`.

use serde::Serialize;
use serde_json::Value;

use mptw_types::{Address, Amount};

use crate::error::ClientError;

/// Parameters for creating a new token issuance.
#[derive(Clone, Debug, Default)]
pub struct IssuanceParams {
    /// Decimal places for display purposes.
    pub asset_scale: u8,
    /// Transfer fee in basis-point-like units; the ledger validates range.
    pub transfer_fee: u16,
    /// Optional cap on outstanding supply.
    pub maximum_amount: Option<String>,
    /// Optional opaque metadata string.
    pub metadata: Option<String>,
    /// Capability names for the flag encoder.
    pub flags: Vec<String>,
}

/// Parameters for a token payment.
#[derive(Clone, Debug)]
pub struct TokenPaymentParams {
    pub destination: Address,
    /// Token value as a decimal string; the issuance's asset scale governs
    /// interpretation.
    pub amount: String,
    pub issuance_id: String,
    pub memo: Option<String>,
}

/// The `Amount` field of a payment: native drops or an issued token.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum PaymentAmount {
    /// Native amount in drops, decimal string.
    Drops(String),
    Token(TokenAmount),
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenAmount {
    pub mpt_issuance_id: String,
    pub value: String,
}

impl PaymentAmount {
    pub fn native(amount: Amount) -> Self {
        Self::Drops(amount.drops().to_string())
    }

    pub fn token(value: &str, issuance_id: &str) -> Self {
        Self::Token(TokenAmount {
            mpt_issuance_id: issuance_id.to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoWrapper {
    pub memo: Memo,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Memo {
    /// Hex-encoded memo payload, per the node's memo convention.
    pub memo_data: String,
}

/// A payment transaction (native funding transfer or token payment).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payment {
    pub transaction_type: &'static str,
    pub account: String,
    pub destination: String,
    pub amount: PaymentAmount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memos: Option<Vec<MemoWrapper>>,
}

impl Payment {
    pub fn new(account: &Address, destination: &Address, amount: PaymentAmount) -> Self {
        Self {
            transaction_type: "Payment",
            account: account.as_str().to_string(),
            destination: destination.as_str().to_string(),
            amount,
            memos: None,
        }
    }

    /// Attach a memo, hex-encoding its bytes.
    pub fn with_memo(mut self, memo: &str) -> Self {
        self.memos = Some(vec![MemoWrapper {
            memo: Memo {
                memo_data: hex::encode(memo.as_bytes()),
            },
        }]);
        self
    }

    pub fn to_value(&self) -> Result<Value, ClientError> {
        serde_json::to_value(self).map_err(|e| ClientError::Build(e.to_string()))
    }
}

/// A token issuance creation transaction.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IssuanceCreate {
    pub transaction_type: &'static str,
    pub account: String,
    pub asset_scale: u8,
    pub transfer_fee: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// Capability bitmask from the flag encoder.
    pub flags: u32,
}

impl IssuanceCreate {
    pub fn new(account: &Address, params: &IssuanceParams, flags: u32) -> Self {
        Self {
            transaction_type: "MPTokenIssuanceCreate",
            account: account.as_str().to_string(),
            asset_scale: params.asset_scale,
            transfer_fee: params.transfer_fee,
            maximum_amount: params.maximum_amount.clone(),
            metadata: params.metadata.clone(),
            flags,
        }
    }

    pub fn to_value(&self) -> Result<Value, ClientError> {
        serde_json::to_value(self).map_err(|e| ClientError::Build(e.to_string()))
    }
}
