//! Cached on-ledger state of the active account.
//!
//! Identity only: the key material that can sign for this account lives
//! in the session's signer, not here.

use serde::Serialize;

use mptw_types::{Address, Amount, PublicKey};

use crate::rpc::AccountData;

/// The active account's identity and last-synchronized ledger state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Account {
    pub address: Address,
    pub public_key: PublicKey,
    /// Native balance at the last refresh.
    pub balance: Amount,
    /// Sequence the ledger expects on this account's next transaction.
    /// Staleness here surfaces as a ledger rejection; it is never guessed.
    pub sequence: u32,
}

impl Account {
    /// A freshly created or loaded account, before any ledger sync.
    pub fn new(address: Address, public_key: PublicKey) -> Self {
        Self {
            address,
            public_key,
            balance: Amount::ZERO,
            sequence: 0,
        }
    }

    /// Overwrite cached state from an `account_info` response.
    ///
    /// An unparseable balance is treated as unfunded rather than an error;
    /// the node is the authority and the cache only mirrors it.
    pub fn apply_info(&mut self, data: &AccountData) {
        self.balance = Amount::parse_drops(&data.balance).unwrap_or(Amount::ZERO);
        self.sequence = data.sequence;
    }

    /// Reset to the unfunded default (address not yet known to the
    /// ledger, common right after generation).
    pub fn reset_unfunded(&mut self) {
        self.balance = Amount::ZERO;
        self.sequence = 0;
    }
}
