use std::future::Future;

use alloy::primitives::B256;
use thiserror::Error;

use crate::domain::actor::{L1Actor, L2Actor};
use crate::domain::merkle::MembershipWitness;
use crate::domain::message::{L2ToL1Message, MessageKey};

/// Failures of the external messaging primitives. Exactly-once consumption
/// is their guarantee, not the portal's.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("merkle path does not verify against the block's outbox root")]
    InvalidProof,

    #[error("message already consumed")]
    AlreadyConsumed,

    #[error("no outbox root published for L2 block {0}")]
    UnknownBlock(u64),
}

/// Port for the rollup's L1→L2 inbox.
pub trait Inbox: Send + Sync {
    /// Emit a message for cross-layer delivery. Returns the inbox-assigned
    /// message key. The message becomes consumable on L2 only once the
    /// rollup includes it in a block.
    fn send_l2_message(
        &self,
        sender: L1Actor,
        recipient: L2Actor,
        content: B256,
        secret_hash: B256,
    ) -> impl Future<Output = Result<MessageKey, MessagingError>> + Send;
}

/// Port for the rollup's L2→L1 outbox.
pub trait Outbox: Send + Sync {
    /// Verify membership of `message` in the named L2 block's outbox tree
    /// and mark it consumed, exactly once.
    fn consume(
        &self,
        message: &L2ToL1Message,
        l2_block_number: u64,
        witness: &MembershipWitness,
    ) -> impl Future<Output = Result<(), MessagingError>> + Send;
}
