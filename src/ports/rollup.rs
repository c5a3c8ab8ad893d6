use std::future::Future;

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::domain::merkle::MembershipWitness;
use crate::domain::message::{L2ToL1Message, MessageKey};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("rollup node unavailable: {0}")]
    Unavailable(String),

    #[error("no sealed L2 block {0}")]
    UnknownBlock(u64),

    #[error("message {message_hash} not found in L2 block {block_number}")]
    NoSuchMessage {
        block_number: u64,
        message_hash: B256,
    },
}

/// Failures of L2 bridge entry points.
#[derive(Debug, Error)]
pub enum L2Error {
    /// Wrong secret, wrong claim path, or an already-claimed message.
    #[error("no matching L1-to-L2 message")]
    NoSuchL1ToL2Message,

    /// Unknown or already-redeemed shield note.
    #[error("no shield note matching the supplied secret")]
    NoSuchShieldNote,

    /// Burn attempted without a matching authorization witness.
    #[error("action not authorized by the account owner")]
    UnauthorizedAction,

    #[error("insufficient L2 balance: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },
}

/// Read-side port for the rollup node.
pub trait RollupNode: Send + Sync {
    /// Number of the latest sealed L2 block.
    fn block_number(&self) -> impl Future<Output = Result<u64, NodeError>> + Send;

    /// Membership witness for an L1→L2 message, or `None` while the message
    /// has not yet been included in a block. Presence of a witness is the
    /// consumability predicate the orchestrator polls on.
    fn l1_to_l2_membership_witness(
        &self,
        key: MessageKey,
    ) -> impl Future<Output = Result<Option<MembershipWitness>, NodeError>> + Send;

    /// Membership witness for an L2→L1 message in a sealed block.
    fn l2_to_l1_membership_witness(
        &self,
        l2_block_number: u64,
        message_hash: B256,
    ) -> impl Future<Output = Result<MembershipWitness, NodeError>> + Send;
}

/// Port for the L2 bridge contract paired with the portal.
pub trait L2Bridge: Send + Sync {
    /// Consume a public-mint message by revealing its consumption secret and
    /// credit `to`'s public balance.
    fn claim_public(
        &self,
        to: B256,
        amount: U256,
        secret: B256,
    ) -> impl Future<Output = Result<(), L2Error>> + Send;

    /// Consume a private-mint message by revealing its consumption secret,
    /// producing a pending shield note redeemable with the note secret.
    fn claim_private(
        &self,
        secret_hash_for_notes: B256,
        amount: U256,
        secret: B256,
    ) -> impl Future<Output = Result<(), L2Error>> + Send;

    /// Redeem a pending shield note for `to`, consuming it exactly once.
    fn redeem_shield(
        &self,
        to: B256,
        amount: U256,
        secret: B256,
    ) -> impl Future<Output = Result<(), L2Error>> + Send;

    /// Register a one-time public authorization for `(owner, action_hash)`.
    fn add_public_authwit(
        &self,
        owner: B256,
        action_hash: B256,
    ) -> impl Future<Output = Result<(), L2Error>> + Send;

    /// Register a one-time private authorization for `(owner, action_hash)`.
    fn add_private_authwit(
        &self,
        owner: B256,
        action_hash: B256,
    ) -> impl Future<Output = Result<(), L2Error>> + Send;

    /// Burn from `from`'s public balance (authwit-gated) and enqueue the
    /// L2→L1 withdrawal message. Returns the message and the number of the
    /// L2 block that will carry it once sealed.
    fn exit_to_l1_public(
        &self,
        from: B256,
        recipient: Address,
        amount: U256,
        caller: Address,
        nonce: B256,
    ) -> impl Future<Output = Result<(L2ToL1Message, u64), L2Error>> + Send;

    /// Burn from `from`'s private balance (authwit-gated) and enqueue the
    /// L2→L1 withdrawal message.
    fn exit_to_l1_private(
        &self,
        from: B256,
        recipient: Address,
        amount: U256,
        caller: Address,
        nonce: B256,
    ) -> impl Future<Output = Result<(L2ToL1Message, u64), L2Error>> + Send;

    fn public_balance_of(
        &self,
        owner: B256,
    ) -> impl Future<Output = Result<U256, L2Error>> + Send;

    fn private_balance_of(
        &self,
        owner: B256,
    ) -> impl Future<Output = Result<U256, L2Error>> + Send;
}
