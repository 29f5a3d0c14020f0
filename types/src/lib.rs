//! Fundamental types for the MPT wallet.
//!
//! This crate defines the core types shared across the workspace:
//! account addresses, key material, transaction hashes, amounts and
//! timestamps. It owns no I/O and no crypto beyond what the types
//! themselves require.

pub mod address;
pub mod amount;
pub mod hash;
pub mod keys;
pub mod time;

pub use address::Address;
pub use amount::{Amount, AmountError};
pub use hash::TxHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::{unix_millis, Timestamp};
