//! Account address derivation from public keys.
//!
//! Address format: `mpt_` + base32(public_key, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: first 5 bytes of Blake2b-256(public_key).
//! Base32 alphabet avoids visually ambiguous characters (0/O, 2/Z, l/I, v).

use mptw_types::{Address, PublicKey};

use crate::hash::blake2b_256;

const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Characters encoding the 256-bit public key: ceil(256 / 5).
const PUBKEY_CHARS: usize = 52;
/// Characters encoding the 40-bit checksum: 40 / 5.
const CHECKSUM_CHARS: usize = 8;
/// Checksum length in bytes.
const CHECKSUM_BYTES: usize = 5;

fn alphabet_index(c: u8) -> Option<u64> {
    ALPHABET.iter().position(|&a| a == c).map(|i| i as u64)
}

/// Encode bytes as base32, padding the final character with zero bits.
fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 8 / 5 + 1);
    let mut acc: u64 = 0;
    let mut bits = 0u32;

    for &byte in bytes {
        acc = (acc << 8) | byte as u64;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((acc << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// Decode a base32 string into `n` bytes. Returns `None` on invalid
/// characters or if the string carries fewer than `n` bytes of data.
fn decode_base32(s: &str, n: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(n);
    let mut acc: u64 = 0;
    let mut bits = 0u32;

    for c in s.bytes() {
        acc = (acc << 5) | alphabet_index(c)?;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            if out.len() < n {
                out.push((acc >> bits) as u8);
            }
        }
    }
    (out.len() == n).then_some(out)
}

fn checksum(public_key: &PublicKey) -> [u8; CHECKSUM_BYTES] {
    let digest = blake2b_256(&public_key.0);
    let mut out = [0u8; CHECKSUM_BYTES];
    out.copy_from_slice(&digest[..CHECKSUM_BYTES]);
    out
}

/// Derive the address for a public key.
pub fn derive_address(public_key: &PublicKey) -> Address {
    let mut encoded = String::with_capacity(Address::PREFIX.len() + PUBKEY_CHARS + CHECKSUM_CHARS);
    encoded.push_str(Address::PREFIX);
    encoded.push_str(&encode_base32(&public_key.0));
    encoded.push_str(&encode_base32(&checksum(public_key)));
    Address::new(encoded)
}

/// Decode an address back into its public key, verifying the checksum.
pub fn decode_address(address: &Address) -> Option<PublicKey> {
    let body = address.as_str().strip_prefix(Address::PREFIX)?;
    if body.len() != PUBKEY_CHARS + CHECKSUM_CHARS {
        return None;
    }

    let key_bytes = decode_base32(&body[..PUBKEY_CHARS], 32)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&key_bytes);
    let public_key = PublicKey(key);

    let check = decode_base32(&body[PUBKEY_CHARS..], CHECKSUM_BYTES)?;
    (check == checksum(&public_key)).then_some(public_key)
}

/// Whether a raw string is a well-formed address with a valid checksum.
pub fn validate_address(raw: &str) -> bool {
    if !raw.starts_with(Address::PREFIX) {
        return false;
    }
    decode_address(&Address::new(raw.to_string())).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn derive_roundtrip() {
        let kp = generate_keypair();
        let addr = derive_address(&kp.public);
        assert_eq!(decode_address(&addr), Some(kp.public));
    }

    #[test]
    fn derived_address_shape() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let addr = derive_address(&kp.public);
        assert!(addr.as_str().starts_with("mpt_"));
        assert_eq!(addr.as_str().len(), 4 + 52 + 8);
    }

    #[test]
    fn derivation_is_deterministic() {
        let kp = keypair_from_seed(&[12u8; 32]);
        assert_eq!(derive_address(&kp.public), derive_address(&kp.public));
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let kp = generate_keypair();
        let addr = derive_address(&kp.public);
        let mut chars: Vec<char> = addr.as_str().chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '1' { '3' } else { '1' };
        let corrupted: String = chars.into_iter().collect();
        assert!(!validate_address(&corrupted));
    }

    #[test]
    fn validate_rejects_garbage() {
        assert!(!validate_address("mpt_short"));
        assert!(!validate_address("brn_notours"));
        assert!(!validate_address(""));
    }

    #[test]
    fn distinct_keys_distinct_addresses() {
        let a = derive_address(&keypair_from_seed(&[1u8; 32]).public);
        let b = derive_address(&keypair_from_seed(&[2u8; 32]).public);
        assert_ne!(a, b);
    }
}
