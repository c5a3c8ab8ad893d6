use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::crypto::hash::{compute_secret_hash, random_secret};
use crate::domain::merkle::MembershipWitness;
use crate::domain::message::{
    burn_private_action_hash, burn_public_action_hash, MessageKey,
};
use crate::portal::{PortalError, TokenPortal};
use crate::ports::attestation::{Attestation, AttestationOracle, OracleError};
use crate::ports::messaging::{Inbox, MessagingError, Outbox};
use crate::ports::rollup::{L2Bridge, L2Error, NodeError, RollupNode};
use crate::ports::token::{TokenError, TokenLedger};

/// Stages of an end-to-end bridge flow. `Redeemed` only occurs on the
/// private path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Escrowed,
    MessageSent,
    AwaitingConsumability,
    ClaimedOnL2,
    Redeemed,
    AuthorizedBurn,
    Burned,
    L2ToL1MessageAvailable,
    WithdrawnOnL1,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStage::Escrowed => "escrowed",
            FlowStage::MessageSent => "message-sent",
            FlowStage::AwaitingConsumability => "awaiting-consumability",
            FlowStage::ClaimedOnL2 => "claimed-on-l2",
            FlowStage::Redeemed => "redeemed",
            FlowStage::AuthorizedBurn => "authorized-burn",
            FlowStage::Burned => "burned",
            FlowStage::L2ToL1MessageAvailable => "l2-to-l1-message-available",
            FlowStage::WithdrawnOnL1 => "withdrawn-on-l1",
        };
        f.write_str(name)
    }
}

/// Failure taxonomy of the bridge protocol. Every cross-layer step is
/// independently fallible and nothing is compensated: a failed claim leaves
/// funds escrowed on L1 until a correct claim happens.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("attestation denied")]
    AttestationDenied,

    #[error("asset transfer failed: {0}")]
    TransferFailed(#[source] TokenError),

    #[error("no matching L1-to-L2 message on the rollup")]
    NoSuchL1ToL2Message,

    #[error("no shield note matching the supplied secret")]
    NoSuchShieldNote,

    #[error("burn not authorized by the account owner")]
    UnauthorizedAction,

    #[error("insufficient L2 balance: have {have}, need {need}")]
    InsufficientL2Balance { have: U256, need: U256 },

    #[error("merkle membership proof rejected")]
    InvalidProof,

    #[error("message already consumed")]
    AlreadyConsumed,

    #[error("attestation oracle unavailable")]
    AttestationUnavailable(#[source] OracleError),

    #[error("condition not met within {0:?}")]
    ConsumabilityTimeout(Duration),

    #[error("rollup node error: {0}")]
    Node(#[from] NodeError),
}

impl From<PortalError> for BridgeError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::AttestationDenied => BridgeError::AttestationDenied,
            PortalError::TransferFailed(e) => BridgeError::TransferFailed(e),
            PortalError::Messaging(MessagingError::AlreadyConsumed) => BridgeError::AlreadyConsumed,
            PortalError::Messaging(MessagingError::InvalidProof)
            | PortalError::Messaging(MessagingError::UnknownBlock(_)) => BridgeError::InvalidProof,
        }
    }
}

impl From<L2Error> for BridgeError {
    fn from(err: L2Error) -> Self {
        match err {
            L2Error::NoSuchL1ToL2Message => BridgeError::NoSuchL1ToL2Message,
            L2Error::NoSuchShieldNote => BridgeError::NoSuchShieldNote,
            L2Error::UnauthorizedAction => BridgeError::UnauthorizedAction,
            L2Error::InsufficientBalance { have, need } => {
                BridgeError::InsufficientL2Balance { have, need }
            }
        }
    }
}

/// Client-side timing for the two asynchronous wait points.
#[derive(Debug, Clone, Copy)]
pub struct FlowTiming {
    pub poll_interval: Duration,
    pub consumability_timeout: Duration,
}

impl Default for FlowTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            consumability_timeout: Duration::from_secs(30),
        }
    }
}

/// Parameters for one end-to-end flow. The same shape drives both variants;
/// the private path additionally derives a note-redemption secret.
#[derive(Debug, Clone, Copy)]
pub struct FlowParams {
    /// L1 account depositing and receiving the withdrawal.
    pub l1_account: Address,
    /// L2 account claiming the mint and burning for exit.
    pub l2_account: B256,
    pub deposit_amount: U256,
    pub withdraw_amount: U256,
    /// Action identifier the attestation is requested for.
    pub action_id: B256,
    /// Restrict withdrawal finalization to `l1_account`.
    pub with_caller: bool,
}

/// Outcome of a completed flow, for assertions and logging.
#[derive(Debug)]
pub struct FlowReport {
    pub deposit_key: MessageKey,
    pub exit_block: u64,
    pub final_stage: FlowStage,
}

/// Sequences the multi-step bridge flow across both layers.
///
/// The two layers advance asynchronously with no shared clock; this is the
/// only place enforcing cross-layer ordering, and it does so by polling
/// externally observable conditions (message inclusion, block production)
/// under a client-side timeout. Contracts impose no expiry of their own.
pub struct BridgeOrchestrator<T, I, O, R, A> {
    portal: Arc<TokenPortal<T, I, O>>,
    rollup: Arc<R>,
    oracle: Arc<A>,
    timing: FlowTiming,
}

impl<T, I, O, R, A> BridgeOrchestrator<T, I, O, R, A>
where
    T: TokenLedger,
    I: Inbox,
    O: Outbox,
    R: RollupNode + L2Bridge,
    A: AttestationOracle,
{
    pub fn new(
        portal: Arc<TokenPortal<T, I, O>>,
        rollup: Arc<R>,
        oracle: Arc<A>,
        timing: FlowTiming,
    ) -> Self {
        Self {
            portal,
            rollup,
            oracle,
            timing,
        }
    }

    /// Fetch an attestation, retrying transport failures at the oracle
    /// adapter's discretion. A negative attestation is a protocol denial
    /// and aborts the flow.
    async fn fetch_attestation(
        &self,
        action_id: B256,
        user: Address,
    ) -> Result<Attestation, BridgeError> {
        let attestation = self
            .oracle
            .fetch_attestation(action_id, user)
            .await
            .map_err(BridgeError::AttestationUnavailable)?;
        if !attestation.is_unique {
            return Err(BridgeError::AttestationDenied);
        }
        Ok(attestation)
    }

    /// Poll until the L1→L2 message is consumable on L2.
    async fn await_consumable(&self, key: MessageKey) -> Result<MembershipWitness, BridgeError> {
        let deadline = Instant::now() + self.timing.consumability_timeout;
        loop {
            if let Some(witness) = self.rollup.l1_to_l2_membership_witness(key).await? {
                return Ok(witness);
            }
            if Instant::now() >= deadline {
                return Err(BridgeError::ConsumabilityTimeout(
                    self.timing.consumability_timeout,
                ));
            }
            debug!(key = %key.as_b256(), "message not yet consumable");
            sleep(self.timing.poll_interval).await;
        }
    }

    /// Poll until the rollup has sealed `block_number`.
    async fn await_block(&self, block_number: u64) -> Result<(), BridgeError> {
        let deadline = Instant::now() + self.timing.consumability_timeout;
        loop {
            if self.rollup.block_number().await? >= block_number {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BridgeError::ConsumabilityTimeout(
                    self.timing.consumability_timeout,
                ));
            }
            debug!(block_number, "waiting for L2 block");
            sleep(self.timing.poll_interval).await;
        }
    }

    fn advance(stage: &mut FlowStage, next: FlowStage) {
        info!(from = %stage, to = %next, "flow transition");
        *stage = next;
    }

    /// Run the public flow: deposit → claim_public → authorized public burn
    /// → withdraw.
    pub async fn run_public_flow(&self, params: FlowParams) -> Result<FlowReport, BridgeError> {
        let attestation = self
            .fetch_attestation(params.action_id, params.l1_account)
            .await?;

        let secret = random_secret();
        let deposit_key = self
            .portal
            .deposit_public(
                params.l1_account,
                params.l2_account,
                params.deposit_amount,
                compute_secret_hash(secret),
                params.action_id,
                &attestation.signature,
            )
            .await?;
        let mut stage = FlowStage::Escrowed;
        Self::advance(&mut stage, FlowStage::MessageSent);

        Self::advance(&mut stage, FlowStage::AwaitingConsumability);
        self.await_consumable(deposit_key).await?;

        self.rollup
            .claim_public(params.l2_account, params.deposit_amount, secret)
            .await?;
        Self::advance(&mut stage, FlowStage::ClaimedOnL2);

        let nonce = random_secret();
        let action =
            burn_public_action_hash(params.l2_account, params.withdraw_amount, nonce);
        self.rollup
            .add_public_authwit(params.l2_account, action)
            .await?;
        Self::advance(&mut stage, FlowStage::AuthorizedBurn);

        let caller_restriction = if params.with_caller {
            params.l1_account
        } else {
            Address::ZERO
        };
        let (message, exit_block) = self
            .rollup
            .exit_to_l1_public(
                params.l2_account,
                params.l1_account,
                params.withdraw_amount,
                caller_restriction,
                nonce,
            )
            .await?;
        Self::advance(&mut stage, FlowStage::Burned);

        self.await_block(exit_block).await?;
        let witness = self
            .rollup
            .l2_to_l1_membership_witness(exit_block, message.hash())
            .await?;
        Self::advance(&mut stage, FlowStage::L2ToL1MessageAvailable);

        self.portal
            .withdraw(
                params.l1_account,
                params.l1_account,
                params.withdraw_amount,
                params.with_caller,
                exit_block,
                witness.leaf_index,
                witness.path,
                params.action_id,
                &attestation.signature,
            )
            .await?;
        Self::advance(&mut stage, FlowStage::WithdrawnOnL1);

        Ok(FlowReport {
            deposit_key,
            exit_block,
            final_stage: stage,
        })
    }

    /// Run the private flow: deposit → claim_private → redeem shield note →
    /// authorized private burn → withdraw.
    pub async fn run_private_flow(&self, params: FlowParams) -> Result<FlowReport, BridgeError> {
        let attestation = self
            .fetch_attestation(params.action_id, params.l1_account)
            .await?;

        let consumption_secret = random_secret();
        let note_secret = random_secret();
        let deposit_key = self
            .portal
            .deposit_private(
                params.l1_account,
                compute_secret_hash(note_secret),
                params.deposit_amount,
                compute_secret_hash(consumption_secret),
                params.action_id,
                &attestation.signature,
            )
            .await?;
        let mut stage = FlowStage::Escrowed;
        Self::advance(&mut stage, FlowStage::MessageSent);

        Self::advance(&mut stage, FlowStage::AwaitingConsumability);
        self.await_consumable(deposit_key).await?;

        self.rollup
            .claim_private(
                compute_secret_hash(note_secret),
                params.deposit_amount,
                consumption_secret,
            )
            .await?;
        Self::advance(&mut stage, FlowStage::ClaimedOnL2);

        // The note is a bearer capability: whoever holds `note_secret` may
        // redeem for any recipient, so a third party can mint on the
        // account's behalf.
        self.rollup
            .redeem_shield(params.l2_account, params.deposit_amount, note_secret)
            .await?;
        Self::advance(&mut stage, FlowStage::Redeemed);

        let nonce = random_secret();
        let action =
            burn_private_action_hash(params.l2_account, params.withdraw_amount, nonce);
        self.rollup
            .add_private_authwit(params.l2_account, action)
            .await?;
        Self::advance(&mut stage, FlowStage::AuthorizedBurn);

        let caller_restriction = if params.with_caller {
            params.l1_account
        } else {
            Address::ZERO
        };
        let (message, exit_block) = self
            .rollup
            .exit_to_l1_private(
                params.l2_account,
                params.l1_account,
                params.withdraw_amount,
                caller_restriction,
                nonce,
            )
            .await?;
        Self::advance(&mut stage, FlowStage::Burned);

        self.await_block(exit_block).await?;
        let witness = self
            .rollup
            .l2_to_l1_membership_witness(exit_block, message.hash())
            .await?;
        Self::advance(&mut stage, FlowStage::L2ToL1MessageAvailable);

        self.portal
            .withdraw(
                params.l1_account,
                params.l1_account,
                params.withdraw_amount,
                params.with_caller,
                exit_block,
                witness.leaf_index,
                witness.path,
                params.action_id,
                &attestation.signature,
            )
            .await?;
        Self::advance(&mut stage, FlowStage::WithdrawnOnL1);

        Ok(FlowReport {
            deposit_key,
            exit_block,
            final_stage: stage,
        })
    }
}
