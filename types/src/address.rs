//! Account address type with `mpt_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An MPT ledger account address, always prefixed with `mpt_`.
///
/// Derived from the account's public key via Blake2b hashing + base32
/// encoding (see `mptw-crypto::address`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all MPT ledger addresses.
    pub const PREFIX: &'static str = "mpt_";

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `mpt_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with mpt_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this address is well-formed at the string level.
    ///
    /// Checksum validation lives in `mptw-crypto::address::validate_address`.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
