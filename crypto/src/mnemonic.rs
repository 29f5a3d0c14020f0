//! BIP39 mnemonic generation and Ed25519 key derivation.
//!
//! Generates a 24-word mnemonic (256-bit entropy) and derives an Ed25519
//! keypair using HMAC-SHA512 keyed with the wallet's BIP44 path, taking the
//! first 32 bytes of the output as the Ed25519 secret key.

use bip39::Mnemonic;
use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use mptw_types::{KeyPair, PrivateKey, PublicKey};
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// BIP44 derivation path for the MPT wallet.
const MPT_BIP44_PATH: &str = "m/44'/8520'/0'/0/0";

/// Errors arising from mnemonic operations.
#[derive(Debug, Error)]
pub enum MnemonicError {
    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}

/// Generate a new 24-word BIP39 mnemonic from 256-bit entropy.
pub fn generate_mnemonic() -> Result<String, MnemonicError> {
    let mut entropy = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| MnemonicError::DerivationFailed(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Derive an Ed25519 keypair from a BIP39 mnemonic phrase.
pub fn keypair_from_mnemonic(phrase: &str) -> Result<KeyPair, MnemonicError> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| MnemonicError::InvalidMnemonic(e.to_string()))?;

    // BIP39 seed (PBKDF2-HMAC-SHA512, empty passphrase), then one
    // HMAC-SHA512 round keyed with the derivation path.
    let seed = mnemonic.to_seed_normalized("");

    let mut mac = HmacSha512::new_from_slice(MPT_BIP44_PATH.as_bytes())
        .map_err(|e| MnemonicError::DerivationFailed(e.to_string()))?;
    mac.update(&seed);
    let derived = mac.finalize().into_bytes();

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&derived[..32]);

    let signing_key = SigningKey::from_bytes(&secret);
    Ok(KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    })
}

/// Validate that a phrase is a well-formed BIP39 mnemonic.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_normalized(phrase).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_mnemonic_is_valid() {
        let phrase = generate_mnemonic().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
        assert!(validate_mnemonic(&phrase));
    }

    #[test]
    fn derivation_is_deterministic() {
        let phrase = generate_mnemonic().unwrap();
        let kp1 = keypair_from_mnemonic(&phrase).unwrap();
        let kp2 = keypair_from_mnemonic(&phrase).unwrap();
        assert_eq!(kp1.public, kp2.public);
    }

    #[test]
    fn invalid_phrase_rejected() {
        assert!(keypair_from_mnemonic("not a mnemonic at all").is_err());
        assert!(!validate_mnemonic("word word word"));
    }

    #[test]
    fn distinct_phrases_distinct_keys() {
        let kp1 = keypair_from_mnemonic(&generate_mnemonic().unwrap()).unwrap();
        let kp2 = keypair_from_mnemonic(&generate_mnemonic().unwrap()).unwrap();
        assert_ne!(kp1.public, kp2.public);
    }
}
