use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::crypto::hash::{amount_word, sha256_to_field};

/// Domain tag for shield-note commitments.
const DOMAIN_SHIELD_NOTE: &[u8] = b"bridge.shield_note";

/// A pending shielded claim on the L2 side of the bridge.
///
/// A private mint does not credit a balance directly: it creates a note
/// commitment that whoever holds the redemption-secret preimage can later
/// consume, naming any recipient. The depositor and the redeemer may be
/// different principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldNote {
    pub amount: U256,
    /// Commitment to the note-redemption secret.
    pub secret_hash: B256,
}

impl ShieldNote {
    pub fn new(amount: U256, secret_hash: B256) -> Self {
        Self {
            amount,
            secret_hash,
        }
    }

    /// commitment = H(tag, amount, secret_hash)
    pub fn commitment(&self) -> B256 {
        let mut buf = Vec::with_capacity(DOMAIN_SHIELD_NOTE.len() + 64);
        buf.extend_from_slice(DOMAIN_SHIELD_NOTE);
        buf.extend_from_slice(amount_word(self.amount).as_slice());
        buf.extend_from_slice(self.secret_hash.as_slice());
        sha256_to_field(&buf)
    }
}
