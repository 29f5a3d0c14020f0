//! Cryptographic primitives for the MPT wallet.
//!
//! - **Ed25519** for transaction signing and verification
//! - **Blake2b** for transaction hashing
//! - Address derivation with `mpt_` prefix and base32 encoding
//! - BIP39 mnemonic key derivation

pub mod address;
pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod sign;

pub use address::{decode_address, derive_address, validate_address};
pub use hash::{blake2b_256, hash_transaction};
pub use keys::{
    generate_keypair, keypair_from_private, keypair_from_seed, public_from_private,
};
pub use mnemonic::{generate_mnemonic, keypair_from_mnemonic, validate_mnemonic, MnemonicError};
pub use sign::{sign_message, verify_signature};
