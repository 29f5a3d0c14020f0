//! Wallet client error taxonomy.
//!
//! A definitive ledger rejection (a `tec`/`tem`/... result code) is NOT an
//! error here: it is a normal outcome carried by `SubmitOutcome` and
//! recorded in the history ledger. These variants cover everything that
//! prevents an operation from reaching, or completing, submission.

use mptw_types::Amount;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("not ready: {0}")]
    NotReady(&'static str),

    #[error("autofill failed: {0}")]
    Autofill(String),

    #[error("transaction build error: {0}")]
    Build(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("funding source has insufficient balance: need {needed}, have {available}")]
    InsufficientFunding { needed: Amount, available: Amount },

    #[error("unknown capability flag: {0:?}")]
    UnknownFlag(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    Amount(#[from] mptw_types::AmountError),

    #[error("node error: {0}")]
    Node(String),

    #[error("history export failed: {0}")]
    Export(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}
