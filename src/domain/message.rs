use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::actor::{L1Actor, L2Actor};
use crate::crypto::hash::{
    address_word, amount_word, content_hash, selector, sha256_to_field, u64_word,
};

/// Inbox-assigned identifier of an emitted L1→L2 message.
///
/// Binds the message hash to the inbox index, so two otherwise identical
/// deposits yield distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey(pub B256);

impl MessageKey {
    pub fn as_b256(&self) -> B256 {
        self.0
    }
}

/// A message travelling from the base layer into the rollup.
///
/// Consumable on L2 only by revealing the preimage of `secret_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1ToL2Message {
    pub sender: L1Actor,
    pub recipient: L2Actor,
    /// Digest binding the target L2 operation and its arguments.
    pub content: B256,
    /// Commitment gating consumption of this message.
    pub secret_hash: B256,
}

impl L1ToL2Message {
    /// Content-addressed hash of the message.
    pub fn hash(&self) -> B256 {
        let words = [
            address_word(self.sender.address),
            u64_word(self.sender.chain_id),
            self.recipient.address,
            u64_word(self.recipient.version),
            self.content,
            self.secret_hash,
        ];
        let mut buf = Vec::with_capacity(32 * words.len());
        for word in &words {
            buf.extend_from_slice(word.as_slice());
        }
        sha256_to_field(&buf)
    }

    /// The inbox key for this message at a given inbox index.
    pub fn key(&self, index: u64) -> MessageKey {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(self.hash().as_slice());
        buf[32..].copy_from_slice(u64_word(index).as_slice());
        MessageKey(sha256_to_field(&buf))
    }
}

/// A message travelling from the rollup back to the base layer.
///
/// Consumable on L1 only with a Merkle membership proof against the outbox
/// root of the L2 block that emitted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2ToL1Message {
    pub sender: L2Actor,
    pub recipient: L1Actor,
    pub content: B256,
}

impl L2ToL1Message {
    /// Content-addressed hash of the message; the leaf inserted into the
    /// outbox tree.
    pub fn hash(&self) -> B256 {
        let words = [
            self.sender.address,
            u64_word(self.sender.version),
            address_word(self.recipient.address),
            u64_word(self.recipient.chain_id),
            self.content,
        ];
        let mut buf = Vec::with_capacity(32 * words.len());
        for word in &words {
            buf.extend_from_slice(word.as_slice());
        }
        sha256_to_field(&buf)
    }
}

// ── Content hash builders ──
//
// Both layers rebuild these digests independently; the argument packing is
// part of the wire protocol and must not change between the emitting and
// consuming side.

/// Content of a public-mint instruction for the L2 bridge.
pub fn mint_public_content(to: B256, amount: U256) -> B256 {
    content_hash(
        selector("mint_public(bytes32,uint256)"),
        &[to, amount_word(amount)],
    )
}

/// Content of a private-mint instruction for the L2 bridge. `secret_hash_for_notes`
/// commits to the note-redemption secret, not to the consumption secret.
pub fn mint_private_content(secret_hash_for_notes: B256, amount: U256) -> B256 {
    content_hash(
        selector("mint_private(bytes32,uint256)"),
        &[secret_hash_for_notes, amount_word(amount)],
    )
}

/// Content of an L2→L1 withdrawal. `caller` is the zero sentinel when any
/// account may finalize the withdrawal, or the finalizing account otherwise.
pub fn withdraw_content(recipient: Address, amount: U256, caller: Address) -> B256 {
    content_hash(
        selector("withdraw(address,uint256,address)"),
        &[address_word(recipient), amount_word(amount), address_word(caller)],
    )
}

/// Action digest an account owner signs off on to let the bridge burn from
/// its public balance. Nonce-scoped so each authorization is single-use.
pub fn burn_public_action_hash(from: B256, amount: U256, nonce: B256) -> B256 {
    content_hash(
        selector("burn_public(bytes32,uint256,bytes32)"),
        &[from, amount_word(amount), nonce],
    )
}

/// Action digest for a burn from a private balance.
pub fn burn_private_action_hash(from: B256, amount: U256, nonce: B256) -> B256 {
    content_hash(
        selector("burn(bytes32,uint256,bytes32)"),
        &[from, amount_word(amount), nonce],
    )
}
