//! Signing seam between the orchestrator and key material.
//!
//! Only the signer holds private keys; the cached `Account` is identity
//! alone. The orchestrator hands a filled transaction to a `Signer` and
//! gets back an opaque signed blob plus its canonical hash.

use serde_json::Value;

use mptw_crypto::{derive_address, generate_keypair, hash_transaction, keypair_from_seed, sign_message};
use mptw_types::{Address, KeyPair, PublicKey, TxHash};

use crate::error::ClientError;

/// A signed, submittable payload and its canonical hash.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    pub blob: String,
    pub hash: TxHash,
}

/// Signing capability for one account.
pub trait Signer {
    fn address(&self) -> &Address;
    fn public_key(&self) -> &PublicKey;

    /// Produce a signed payload from a filled (autofilled) transaction.
    fn sign_transaction(&self, tx: &Value) -> Result<SignedTransaction, ClientError>;
}

/// In-memory Ed25519 signer. Key bytes are zeroized when dropped (via
/// `PrivateKey`).
pub struct LocalSigner {
    keypair: KeyPair,
    address: Address,
}

impl LocalSigner {
    pub fn new(keypair: KeyPair) -> Self {
        let address = derive_address(&keypair.public);
        Self { keypair, address }
    }

    pub fn generate() -> Self {
        Self::new(generate_keypair())
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(keypair_from_seed(seed))
    }

    /// Build a signer from a 64-character hex seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, ClientError> {
        let bytes = hex::decode(seed_hex)
            .map_err(|e| ClientError::Key(format!("invalid hex seed: {e}")))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ClientError::Key("seed must be 32 bytes".to_string()))?;
        Ok(Self::from_seed(&seed))
    }
}

impl Signer for LocalSigner {
    fn address(&self) -> &Address {
        &self.address
    }

    fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    fn sign_transaction(&self, tx: &Value) -> Result<SignedTransaction, ClientError> {
        let mut signed = tx.clone();
        let obj = signed
            .as_object_mut()
            .ok_or_else(|| ClientError::Signing("transaction must be a JSON object".to_string()))?;

        obj.insert(
            "SigningPubKey".to_string(),
            Value::String(hex::encode(self.keypair.public.0)),
        );

        // serde_json keeps object keys sorted, so this serialization is
        // canonical for signing.
        let canonical = serde_json::to_string(&signed)
            .map_err(|e| ClientError::Signing(format!("serialization failed: {e}")))?;
        let signature = sign_message(canonical.as_bytes(), &self.keypair.private);

        signed
            .as_object_mut()
            .ok_or_else(|| ClientError::Signing("transaction must be a JSON object".to_string()))?
            .insert(
                "TxnSignature".to_string(),
                Value::String(hex::encode(signature.0)),
            );

        let blob = signed.to_string();
        let hash = hash_transaction(blob.as_bytes());
        Ok(SignedTransaction { blob, hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mptw_crypto::verify_signature;
    use mptw_types::Signature;
    use serde_json::json;

    #[test]
    fn signer_address_matches_key() {
        let signer = LocalSigner::from_seed(&[5u8; 32]);
        assert_eq!(signer.address(), &derive_address(signer.public_key()));
    }

    #[test]
    fn from_seed_hex_roundtrip() {
        let hex_seed = "05".repeat(32);
        let signer = LocalSigner::from_seed_hex(&hex_seed).unwrap();
        assert_eq!(signer.address(), LocalSigner::from_seed(&[5u8; 32]).address());
    }

    #[test]
    fn from_seed_hex_rejects_bad_input() {
        assert!(LocalSigner::from_seed_hex("zz").is_err());
        assert!(LocalSigner::from_seed_hex(&"ab".repeat(16)).is_err());
    }

    #[test]
    fn signed_blob_carries_signature_fields() {
        let signer = LocalSigner::generate();
        let tx = json!({ "TransactionType": "Payment", "Fee": "10", "Sequence": 1 });
        let signed = signer.sign_transaction(&tx).unwrap();

        let blob: Value = serde_json::from_str(&signed.blob).unwrap();
        assert!(blob["SigningPubKey"].is_string());
        assert!(blob["TxnSignature"].is_string());
        assert_eq!(blob["TransactionType"], "Payment");
        assert!(!signed.hash.is_zero());
    }

    #[test]
    fn signature_verifies_over_canonical_form() {
        let signer = LocalSigner::from_seed(&[9u8; 32]);
        let tx = json!({ "TransactionType": "Payment", "Fee": "10" });
        let signed = signer.sign_transaction(&tx).unwrap();

        let mut blob: Value = serde_json::from_str(&signed.blob).unwrap();
        let sig_hex = blob
            .as_object_mut()
            .unwrap()
            .remove("TxnSignature")
            .unwrap();
        let sig_bytes: [u8; 64] = hex::decode(sig_hex.as_str().unwrap())
            .unwrap()
            .try_into()
            .unwrap();

        let canonical = serde_json::to_string(&blob).unwrap();
        assert!(verify_signature(
            canonical.as_bytes(),
            &Signature(sig_bytes),
            signer.public_key()
        ));
    }

    #[test]
    fn non_object_transaction_rejected() {
        let signer = LocalSigner::generate();
        assert!(matches!(
            signer.sign_transaction(&json!([1, 2, 3])),
            Err(ClientError::Signing(_))
        ));
    }

    #[test]
    fn hash_is_deterministic_per_blob() {
        let signer = LocalSigner::from_seed(&[1u8; 32]);
        let tx = json!({ "TransactionType": "Payment" });
        let a = signer.sign_transaction(&tx).unwrap();
        let b = signer.sign_transaction(&tx).unwrap();
        assert_eq!(a.hash, b.hash);
    }
}
