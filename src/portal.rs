use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;
use tracing::info;

use crate::attestation::AttestationVerifier;
use crate::domain::actor::{L1Actor, L2Actor};
use crate::domain::merkle::MembershipWitness;
use crate::domain::message::{
    mint_private_content, mint_public_content, withdraw_content, L2ToL1Message, MessageKey,
};
use crate::ports::messaging::{Inbox, MessagingError, Outbox};
use crate::ports::token::{TokenError, TokenLedger};

/// Immutable portal parameters, bound once at construction.
///
/// There is deliberately no `initialize` entry point: configuration is
/// consumed by [`TokenPortal::new`], so re-initialization is unrepresentable.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// The portal's own identity on L1; escrow is held under this address.
    pub portal: L1Actor,
    /// The L2 bridge contract this portal pairs with.
    pub l2_bridge: L2Actor,
    /// Trusted attestation signer.
    pub attester: Address,
    /// Circuit identifier every attestation must be issued for.
    pub circuit_id: B256,
}

#[derive(Debug, Error)]
pub enum PortalError {
    /// Attestation signature invalid or signer mismatch. Fail closed, no
    /// state change.
    #[error("attestation denied")]
    AttestationDenied,

    /// The underlying asset rejected the escrow pull or the release.
    #[error("asset transfer failed: {0}")]
    TransferFailed(#[source] TokenError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

/// L1 portal: escrows the underlying asset and relays message hashes to the
/// rollup's messaging primitives.
///
/// Deposits pull funds into escrow *before* emitting the L1→L2 message, so
/// no message ever exists without matching escrow. Withdrawals consume the
/// L2→L1 message *before* releasing funds, so a re-entered call with the
/// same proof dies on the outbox's consume-once guarantee rather than
/// double-paying.
pub struct TokenPortal<T, I, O> {
    config: PortalConfig,
    verifier: AttestationVerifier,
    token: Arc<T>,
    inbox: Arc<I>,
    outbox: Arc<O>,
}

impl<T, I, O> TokenPortal<T, I, O>
where
    T: TokenLedger,
    I: Inbox,
    O: Outbox,
{
    pub fn new(config: PortalConfig, token: Arc<T>, inbox: Arc<I>, outbox: Arc<O>) -> Self {
        let verifier = AttestationVerifier::new(config.attester);
        Self {
            config,
            verifier,
            token,
            inbox,
            outbox,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Attestation check against the portal's fixed circuit id.
    pub fn verify_signature(
        &self,
        circuit_id: B256,
        action_id: B256,
        user: Address,
        signature: &[u8],
    ) -> bool {
        self.verifier.verify(circuit_id, action_id, user, signature)
    }

    fn check_attestation(
        &self,
        action_id: B256,
        caller: Address,
        signature: &[u8],
    ) -> Result<(), PortalError> {
        if self.verify_signature(self.config.circuit_id, action_id, caller, signature) {
            Ok(())
        } else {
            Err(PortalError::AttestationDenied)
        }
    }

    /// Escrow `amount` from `from` and emit a public-mint message for `to`
    /// on L2. Returns the inbox message key.
    ///
    /// Emission does not guarantee L2-side success: a failed claim leaves
    /// the funds escrowed until a correct claim happens.
    pub async fn deposit_public(
        &self,
        from: Address,
        to: B256,
        amount: U256,
        secret_hash: B256,
        action_id: B256,
        signature: &[u8],
    ) -> Result<MessageKey, PortalError> {
        self.check_attestation(action_id, from, signature)?;

        self.token
            .transfer_from(self.config.portal.address, from, self.config.portal.address, amount)
            .await
            .map_err(PortalError::TransferFailed)?;

        let content = mint_public_content(to, amount);
        let key = self
            .inbox
            .send_l2_message(self.config.portal, self.config.l2_bridge, content, secret_hash)
            .await?;

        info!(%amount, key = %key.as_b256(), "public deposit escrowed and message emitted");
        Ok(key)
    }

    /// Escrow `amount` from `from` and emit a private-mint message whose
    /// note is redeemable by whoever knows the preimage of
    /// `secret_hash_for_notes`.
    pub async fn deposit_private(
        &self,
        from: Address,
        secret_hash_for_notes: B256,
        amount: U256,
        secret_hash_for_consumption: B256,
        action_id: B256,
        signature: &[u8],
    ) -> Result<MessageKey, PortalError> {
        self.check_attestation(action_id, from, signature)?;

        self.token
            .transfer_from(self.config.portal.address, from, self.config.portal.address, amount)
            .await
            .map_err(PortalError::TransferFailed)?;

        let content = mint_private_content(secret_hash_for_notes, amount);
        let key = self
            .inbox
            .send_l2_message(
                self.config.portal,
                self.config.l2_bridge,
                content,
                secret_hash_for_consumption,
            )
            .await?;

        info!(%amount, key = %key.as_b256(), "private deposit escrowed and message emitted");
        Ok(key)
    }

    /// Consume a withdrawal message proven against `l2_block_number`'s
    /// outbox root, then release `amount` to `recipient`.
    ///
    /// With `with_caller` the reconstructed message binds `caller`, so only
    /// the account that initiated the exit may finalize it; otherwise the
    /// zero sentinel leaves finalization open to anyone holding the proof.
    #[allow(clippy::too_many_arguments)]
    pub async fn withdraw(
        &self,
        caller: Address,
        recipient: Address,
        amount: U256,
        with_caller: bool,
        l2_block_number: u64,
        leaf_index: u64,
        path: Vec<B256>,
        action_id: B256,
        signature: &[u8],
    ) -> Result<(), PortalError> {
        self.check_attestation(action_id, caller, signature)?;

        let caller_restriction = if with_caller { caller } else { Address::ZERO };
        let message = L2ToL1Message {
            sender: self.config.l2_bridge,
            recipient: self.config.portal,
            content: withdraw_content(recipient, amount, caller_restriction),
        };
        let witness = MembershipWitness { leaf_index, path };

        // Consume before transferring: the outbox's consume-once invariant
        // is the reentrancy guard.
        self.outbox.consume(&message, l2_block_number, &witness).await?;

        self.token
            .transfer(self.config.portal.address, recipient, amount)
            .await
            .map_err(PortalError::TransferFailed)?;

        info!(%amount, %recipient, l2_block_number, "withdrawal consumed and released");
        Ok(())
    }

    /// Escrowed balance currently held by the portal.
    pub async fn escrow_balance(&self) -> Result<U256, TokenError> {
        self.token.balance_of(self.config.portal.address).await
    }
}
