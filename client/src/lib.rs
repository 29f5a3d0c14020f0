//! Client-side orchestration for an MPX ledger node.
//!
//! A [`Session`] owns one WebSocket connection, an optional active
//! account with its signing key, and a bounded history of attempted
//! operations. It drives the full transaction pipeline: precondition
//! checks, construction, autofill from ledger state, local signing,
//! submission, and finality polling.
//!
//! The crate performs no I/O beyond the node connection and an explicit
//! history export; process concerns (terminal output, tracing sinks,
//! config files) belong to the binary built on top of it.

pub mod account;
pub mod config;
pub mod connection;
pub mod error;
pub mod flags;
pub mod history;
pub mod rpc;
pub mod session;
pub mod signer;
pub mod transaction;

pub use account::Account;
pub use config::SessionConfig;
pub use connection::{ConnectionManager, ConnectionState, NodeHandle};
pub use error::ClientError;
pub use flags::{encode_flags, FlagMode, ISSUANCE_FLAGS};
pub use history::{HistoryLedger, RecordKind, TransactionRecord, MAX_RETAINED};
pub use session::{Session, SubmitOutcome};
pub use signer::{LocalSigner, SignedTransaction, Signer};
pub use transaction::{IssuanceParams, TokenPaymentParams};
