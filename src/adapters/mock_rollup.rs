use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::crypto::hash::compute_secret_hash;
use crate::domain::actor::{L1Actor, L2Actor};
use crate::domain::merkle::{verify_membership, MembershipWitness, MessageTree};
use crate::domain::message::{
    burn_private_action_hash, burn_public_action_hash, mint_private_content, mint_public_content,
    withdraw_content, L1ToL2Message, L2ToL1Message, MessageKey,
};
use crate::domain::note::ShieldNote;
use crate::ports::messaging::{Inbox, MessagingError, Outbox};
use crate::ports::rollup::{L2Bridge, L2Error, NodeError, RollupNode};

/// An L1→L2 message the rollup has included in a block.
struct IncludedMessage {
    hash: B256,
    key: MessageKey,
    leaf_index: u64,
}

/// A sealed L2 block's outbox tree, with its root "published" to L1.
struct SealedBlock {
    tree: MessageTree,
    root: B256,
    index_by_hash: HashMap<B256, u64>,
}

#[derive(Default)]
struct RollupState {
    // inbox side
    next_message_index: u64,
    pending_l1_to_l2: Vec<(L1ToL2Message, MessageKey)>,
    in_tree: MessageTree,
    included: Vec<IncludedMessage>,
    consumed_keys: HashSet<B256>,

    // L2 bridge token state
    public_balances: HashMap<B256, U256>,
    private_balances: HashMap<B256, U256>,
    /// shield-note commitment → outstanding count
    pending_shields: HashMap<B256, u32>,
    public_authwits: HashSet<(B256, B256)>,
    private_authwits: HashSet<(B256, B256)>,

    // outbox side
    building_out: Vec<B256>,
    sealed: HashMap<u64, SealedBlock>,
    block_number: u64,
    consumed_out: HashSet<B256>,
}

/// In-memory rollup standing in for the external node, its messaging
/// primitives, and the L2 bridge contract.
///
/// Implements all four rollup-facing ports against a single state machine:
/// `send_l2_message` queues an L1→L2 message, `advance_block` includes
/// queued messages and seals the building block's outbox tree, the bridge
/// entry points consume messages and maintain L2 balances, and `consume`
/// enforces the outbox's exactly-once guarantee with real Merkle
/// verification.
pub struct MockRollup {
    portal: L1Actor,
    bridge: L2Actor,
    state: Mutex<RollupState>,
}

impl MockRollup {
    /// `portal` is the only L1 actor whose messages the bridge will claim;
    /// `bridge` is the L2 actor messages are addressed to.
    pub fn new(portal: L1Actor, bridge: L2Actor) -> Self {
        Self {
            portal,
            bridge,
            state: Mutex::new(RollupState::default()),
        }
    }

    pub fn bridge_actor(&self) -> L2Actor {
        self.bridge
    }

    /// Seal the building block: include every pending L1→L2 message in the
    /// message tree and publish the block's outbox root. Returns the new
    /// block number.
    pub async fn advance_block(&self) -> u64 {
        let mut state = self.state.lock().await;

        let pending = std::mem::take(&mut state.pending_l1_to_l2);
        for (message, key) in pending {
            let leaf_index = state.in_tree.insert(key.as_b256());
            state.included.push(IncludedMessage {
                hash: message.hash(),
                key,
                leaf_index,
            });
        }

        let mut tree = MessageTree::new();
        let mut index_by_hash = HashMap::new();
        for hash in std::mem::take(&mut state.building_out) {
            let index = tree.insert(hash);
            index_by_hash.insert(hash, index);
        }
        let root = tree.root();

        state.block_number += 1;
        let number = state.block_number;
        state.sealed.insert(
            number,
            SealedBlock {
                tree,
                root,
                index_by_hash,
            },
        );
        debug!(block = number, "sealed L2 block");
        number
    }

    /// Run block production on an interval until aborted.
    pub fn spawn_block_producer(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let rollup = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                rollup.advance_block().await;
            }
        })
    }

    /// Consume the first included, not-yet-consumed message matching
    /// `expected`. Matching by full message hash means a wrong secret, a
    /// wrong claim path, or an already-claimed message are all the same
    /// outcome: no such message.
    fn consume_l1_to_l2(state: &mut RollupState, expected: &L1ToL2Message) -> Result<(), L2Error> {
        let hash = expected.hash();
        let key = state
            .included
            .iter()
            .find(|entry| entry.hash == hash && !state.consumed_keys.contains(&entry.key.as_b256()))
            .map(|entry| entry.key.as_b256())
            .ok_or(L2Error::NoSuchL1ToL2Message)?;
        state.consumed_keys.insert(key);
        Ok(())
    }

    fn debit_l2(
        balances: &mut HashMap<B256, U256>,
        owner: B256,
        amount: U256,
    ) -> Result<(), L2Error> {
        let have = balances.get(&owner).copied().unwrap_or(U256::ZERO);
        let remaining = have
            .checked_sub(amount)
            .ok_or(L2Error::InsufficientBalance { have, need: amount })?;
        balances.insert(owner, remaining);
        Ok(())
    }
}

impl Inbox for MockRollup {
    async fn send_l2_message(
        &self,
        sender: L1Actor,
        recipient: L2Actor,
        content: B256,
        secret_hash: B256,
    ) -> Result<MessageKey, MessagingError> {
        let mut state = self.state.lock().await;
        let message = L1ToL2Message {
            sender,
            recipient,
            content,
            secret_hash,
        };
        let index = state.next_message_index;
        state.next_message_index += 1;
        let key = message.key(index);
        state.pending_l1_to_l2.push((message, key));
        info!(index, key = %key.as_b256(), "L1->L2 message queued");
        Ok(key)
    }
}

impl Outbox for MockRollup {
    async fn consume(
        &self,
        message: &L2ToL1Message,
        l2_block_number: u64,
        witness: &MembershipWitness,
    ) -> Result<(), MessagingError> {
        let mut state = self.state.lock().await;
        let hash = message.hash();

        let root = state
            .sealed
            .get(&l2_block_number)
            .map(|block| block.root)
            .ok_or(MessagingError::UnknownBlock(l2_block_number))?;

        if state.consumed_out.contains(&hash) {
            return Err(MessagingError::AlreadyConsumed);
        }
        if !verify_membership(hash, witness, root) {
            return Err(MessagingError::InvalidProof);
        }
        state.consumed_out.insert(hash);
        info!(l2_block_number, message = %hash, "L2->L1 message consumed");
        Ok(())
    }
}

impl RollupNode for MockRollup {
    async fn block_number(&self) -> Result<u64, NodeError> {
        Ok(self.state.lock().await.block_number)
    }

    async fn l1_to_l2_membership_witness(
        &self,
        key: MessageKey,
    ) -> Result<Option<MembershipWitness>, NodeError> {
        let state = self.state.lock().await;
        let entry = state
            .included
            .iter()
            .find(|entry| entry.key == key);
        Ok(entry.and_then(|entry| state.in_tree.witness(entry.leaf_index)))
    }

    async fn l2_to_l1_membership_witness(
        &self,
        l2_block_number: u64,
        message_hash: B256,
    ) -> Result<MembershipWitness, NodeError> {
        let state = self.state.lock().await;
        let block = state
            .sealed
            .get(&l2_block_number)
            .ok_or(NodeError::UnknownBlock(l2_block_number))?;
        let index = block
            .index_by_hash
            .get(&message_hash)
            .copied()
            .ok_or(NodeError::NoSuchMessage {
                block_number: l2_block_number,
                message_hash,
            })?;
        block
            .tree
            .witness(index)
            .ok_or(NodeError::NoSuchMessage {
                block_number: l2_block_number,
                message_hash,
            })
    }
}

impl L2Bridge for MockRollup {
    async fn claim_public(&self, to: B256, amount: U256, secret: B256) -> Result<(), L2Error> {
        let mut state = self.state.lock().await;
        let expected = L1ToL2Message {
            sender: self.portal,
            recipient: self.bridge,
            content: mint_public_content(to, amount),
            secret_hash: compute_secret_hash(secret),
        };
        Self::consume_l1_to_l2(&mut state, &expected)?;
        *state.public_balances.entry(to).or_insert(U256::ZERO) += amount;
        info!(%amount, "public claim minted");
        Ok(())
    }

    async fn claim_private(
        &self,
        secret_hash_for_notes: B256,
        amount: U256,
        secret: B256,
    ) -> Result<(), L2Error> {
        let mut state = self.state.lock().await;
        let expected = L1ToL2Message {
            sender: self.portal,
            recipient: self.bridge,
            content: mint_private_content(secret_hash_for_notes, amount),
            secret_hash: compute_secret_hash(secret),
        };
        Self::consume_l1_to_l2(&mut state, &expected)?;
        let commitment = ShieldNote::new(amount, secret_hash_for_notes).commitment();
        *state.pending_shields.entry(commitment).or_insert(0) += 1;
        info!(%amount, "private claim produced shield note");
        Ok(())
    }

    async fn redeem_shield(&self, to: B256, amount: U256, secret: B256) -> Result<(), L2Error> {
        let mut state = self.state.lock().await;
        let commitment = ShieldNote::new(amount, compute_secret_hash(secret)).commitment();
        match state.pending_shields.get_mut(&commitment) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    state.pending_shields.remove(&commitment);
                }
            }
            _ => return Err(L2Error::NoSuchShieldNote),
        }
        *state.private_balances.entry(to).or_insert(U256::ZERO) += amount;
        info!(%amount, "shield note redeemed");
        Ok(())
    }

    async fn add_public_authwit(&self, owner: B256, action_hash: B256) -> Result<(), L2Error> {
        let mut state = self.state.lock().await;
        state.public_authwits.insert((owner, action_hash));
        Ok(())
    }

    async fn add_private_authwit(&self, owner: B256, action_hash: B256) -> Result<(), L2Error> {
        let mut state = self.state.lock().await;
        state.private_authwits.insert((owner, action_hash));
        Ok(())
    }

    async fn exit_to_l1_public(
        &self,
        from: B256,
        recipient: Address,
        amount: U256,
        caller: Address,
        nonce: B256,
    ) -> Result<(L2ToL1Message, u64), L2Error> {
        let mut state = self.state.lock().await;
        let action = burn_public_action_hash(from, amount, nonce);
        if !state.public_authwits.contains(&(from, action)) {
            return Err(L2Error::UnauthorizedAction);
        }
        // Debit before consuming the authwit so a failed burn is atomic.
        Self::debit_l2(&mut state.public_balances, from, amount)?;
        state.public_authwits.remove(&(from, action));

        let message = L2ToL1Message {
            sender: self.bridge,
            recipient: self.portal,
            content: withdraw_content(recipient, amount, caller),
        };
        state.building_out.push(message.hash());
        let block = state.block_number + 1;
        info!(%amount, block, "public burn queued L2->L1 withdrawal");
        Ok((message, block))
    }

    async fn exit_to_l1_private(
        &self,
        from: B256,
        recipient: Address,
        amount: U256,
        caller: Address,
        nonce: B256,
    ) -> Result<(L2ToL1Message, u64), L2Error> {
        let mut state = self.state.lock().await;
        let action = burn_private_action_hash(from, amount, nonce);
        if !state.private_authwits.contains(&(from, action)) {
            return Err(L2Error::UnauthorizedAction);
        }
        Self::debit_l2(&mut state.private_balances, from, amount)?;
        state.private_authwits.remove(&(from, action));

        let message = L2ToL1Message {
            sender: self.bridge,
            recipient: self.portal,
            content: withdraw_content(recipient, amount, caller),
        };
        state.building_out.push(message.hash());
        let block = state.block_number + 1;
        info!(%amount, block, "private burn queued L2->L1 withdrawal");
        Ok((message, block))
    }

    async fn public_balance_of(&self, owner: B256) -> Result<U256, L2Error> {
        let state = self.state.lock().await;
        Ok(state.public_balances.get(&owner).copied().unwrap_or(U256::ZERO))
    }

    async fn private_balance_of(&self, owner: B256) -> Result<U256, L2Error> {
        let state = self.state.lock().await;
        Ok(state.private_balances.get(&owner).copied().unwrap_or(U256::ZERO))
    }
}
