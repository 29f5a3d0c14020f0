//! Issuance capability flag encoding.
//!
//! Maps human-readable capability names onto the bitmask the ledger
//! expects on an issuance-create transaction. Each flag is a distinct
//! power of two, so encoding is a plain bitwise OR and order-independent.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Named capability bits accepted on an issuance.
pub const ISSUANCE_FLAGS: [(&str, u32); 6] = [
    ("Can Lock", 0x0000_0001),
    ("Require Auth", 0x0000_0002),
    ("Can Escrow", 0x0000_0004),
    ("Can Trade", 0x0000_0008),
    ("Can Transfer", 0x0000_0010),
    ("Can Clawback", 0x0000_0020),
];

/// How `encode_flags` treats capability names it does not recognize.
///
/// The lenient mode matches the historical behavior (unknown names
/// contribute zero bits); strict mode turns a typo into an error instead
/// of a silently inert flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagMode {
    #[default]
    Lenient,
    Strict,
}

/// Look up the bit value for a capability name.
pub fn flag_bit(name: &str) -> Option<u32> {
    ISSUANCE_FLAGS
        .iter()
        .find(|(flag, _)| *flag == name)
        .map(|(_, bit)| *bit)
}

/// Encode a set of capability names into the ledger flag bitmask.
///
/// Deterministic and stateless. `Lenient` ignores unrecognized names;
/// `Strict` rejects them with `ClientError::UnknownFlag`.
pub fn encode_flags<S: AsRef<str>>(names: &[S], mode: FlagMode) -> Result<u32, ClientError> {
    let mut bits = 0u32;
    for name in names {
        match flag_bit(name.as_ref()) {
            Some(bit) => bits |= bit,
            None => {
                if mode == FlagMode::Strict {
                    return Err(ClientError::UnknownFlag(name.as_ref().to_string()));
                }
            }
        }
    }
    Ok(bits)
}
