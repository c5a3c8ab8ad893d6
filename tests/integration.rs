//! End-to-end tests for the bridge protocol.
//!
//! Everything runs against the in-memory rollup: the portal escrows on the
//! mock token ledger, messages travel through the mock inbox/outbox with
//! real Merkle verification, and the orchestrator drives the public and
//! private flows the way a client would, including the polling waits for
//! block production.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};

use token_bridge::adapters::attestor::LocalAttestor;
use token_bridge::adapters::memory_token::InMemoryTokenLedger;
use token_bridge::adapters::mock_rollup::MockRollup;
use token_bridge::crypto::hash::{compute_secret_hash, random_secret};
use token_bridge::domain::actor::{L1Actor, L2Actor, MESSAGE_VERSION};
use token_bridge::domain::message::{burn_public_action_hash, L2ToL1Message};
use token_bridge::orchestrator::{BridgeError, BridgeOrchestrator, FlowParams, FlowTiming};
use token_bridge::portal::{PortalConfig, PortalError, TokenPortal};
use token_bridge::ports::messaging::MessagingError;
use token_bridge::ports::rollup::{L2Bridge, L2Error, RollupNode};
use token_bridge::ports::token::TokenLedger;

type HarnessPortal = TokenPortal<InMemoryTokenLedger, MockRollup, MockRollup>;
type HarnessOrchestrator =
    BridgeOrchestrator<InMemoryTokenLedger, MockRollup, MockRollup, MockRollup, LocalAttestor>;

const CHAIN_ID: u64 = 31337;
const CIRCUIT_ID: B256 = B256::repeat_byte(0x77);

const ALICE: Address = Address::repeat_byte(0x01);
const ALICE_L2: B256 = B256::repeat_byte(0x02);
const BOB: Address = Address::repeat_byte(0x03);

struct Harness {
    token: Arc<InMemoryTokenLedger>,
    rollup: Arc<MockRollup>,
    portal: Arc<HarnessPortal>,
    attestor: Arc<LocalAttestor>,
    orchestrator: HarnessOrchestrator,
    portal_address: Address,
}

impl Harness {
    fn build(attestor: LocalAttestor) -> Self {
        let portal_actor = L1Actor::new(Address::repeat_byte(0xA0), CHAIN_ID);
        let bridge_actor = L2Actor::new(B256::repeat_byte(0xB0), MESSAGE_VERSION);
        let attestor = Arc::new(attestor);

        let token = Arc::new(InMemoryTokenLedger::new());
        let rollup = Arc::new(MockRollup::new(portal_actor, bridge_actor));
        let portal = Arc::new(TokenPortal::new(
            PortalConfig {
                portal: portal_actor,
                l2_bridge: bridge_actor,
                attester: attestor.address(),
                circuit_id: CIRCUIT_ID,
            },
            token.clone(),
            rollup.clone(),
            rollup.clone(),
        ));

        let orchestrator = BridgeOrchestrator::new(
            portal.clone(),
            rollup.clone(),
            attestor.clone(),
            FlowTiming {
                poll_interval: Duration::from_millis(10),
                consumability_timeout: Duration::from_secs(10),
            },
        );

        Self {
            token,
            rollup,
            portal,
            attestor,
            orchestrator,
            portal_address: portal_actor.address,
        }
    }

    fn new() -> Self {
        Self::build(LocalAttestor::random(CIRCUIT_ID))
    }

    /// Mint `amount` to `account` and approve the portal to pull it.
    async fn fund(&self, account: Address, amount: U256) {
        self.token.mint(account, amount).await.unwrap();
        self.token
            .approve(account, self.portal_address, amount)
            .await
            .unwrap();
    }

    fn signature(&self, action_id: B256, user: Address) -> Vec<u8> {
        self.attestor.attest(action_id, user).unwrap().signature.to_vec()
    }

    /// Deposit publicly and seal the block so the message is consumable.
    /// Returns the consumption secret.
    async fn deposit_public_sealed(&self, amount: U256, action_id: B256) -> B256 {
        let secret = random_secret();
        self.portal
            .deposit_public(
                ALICE,
                ALICE_L2,
                amount,
                compute_secret_hash(secret),
                action_id,
                &self.signature(action_id, ALICE),
            )
            .await
            .unwrap();
        self.rollup.advance_block().await;
        secret
    }

    /// Claim, authorize, burn, and seal the exit block. Returns the exit
    /// message and its block number.
    async fn claim_and_exit(
        &self,
        deposit: U256,
        withdraw: U256,
        secret: B256,
        caller_restriction: Address,
    ) -> (L2ToL1Message, u64) {
        self.rollup
            .claim_public(ALICE_L2, deposit, secret)
            .await
            .unwrap();
        let nonce = random_secret();
        self.rollup
            .add_public_authwit(ALICE_L2, burn_public_action_hash(ALICE_L2, withdraw, nonce))
            .await
            .unwrap();
        let (message, block) = self
            .rollup
            .exit_to_l1_public(ALICE_L2, ALICE, withdraw, caller_restriction, nonce)
            .await
            .unwrap();
        self.rollup.advance_block().await;
        (message, block)
    }
}

#[tokio::test]
async fn test_deposit_moves_exactly_amount_into_escrow() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(1000u64)).await;

    let action_id = B256::repeat_byte(0x11);
    h.portal
        .deposit_public(
            ALICE,
            ALICE_L2,
            U256::from(100u64),
            compute_secret_hash(random_secret()),
            action_id,
            &h.signature(action_id, ALICE),
        )
        .await
        .unwrap();

    assert_eq!(h.token.balance_of(ALICE).await.unwrap(), U256::from(900u64));
    assert_eq!(h.portal.escrow_balance().await.unwrap(), U256::from(100u64));
}

#[tokio::test]
async fn test_claim_secret_gating() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;
    let amount = U256::from(100u64);
    let secret = h.deposit_public_sealed(amount, B256::repeat_byte(0x11)).await;

    // Wrong secret against an existing message.
    let wrong = h.rollup.claim_public(ALICE_L2, amount, random_secret()).await;
    assert!(matches!(wrong, Err(L2Error::NoSuchL1ToL2Message)));

    // Correct secret succeeds exactly once.
    h.rollup.claim_public(ALICE_L2, amount, secret).await.unwrap();
    assert_eq!(h.rollup.public_balance_of(ALICE_L2).await.unwrap(), amount);

    let second = h.rollup.claim_public(ALICE_L2, amount, secret).await;
    assert!(matches!(second, Err(L2Error::NoSuchL1ToL2Message)));
    assert_eq!(h.rollup.public_balance_of(ALICE_L2).await.unwrap(), amount);
}

#[tokio::test]
async fn test_private_deposit_rejects_public_claim() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;
    let amount = U256::from(100u64);
    let action_id = B256::repeat_byte(0x11);

    let secret = random_secret();
    let note_secret = random_secret();
    h.portal
        .deposit_private(
            ALICE,
            compute_secret_hash(note_secret),
            amount,
            compute_secret_hash(secret),
            action_id,
            &h.signature(action_id, ALICE),
        )
        .await
        .unwrap();
    h.rollup.advance_block().await;

    // Same message, wrong path: the content hash does not match a public
    // mint, even with the correct consumption secret.
    let result = h.rollup.claim_public(ALICE_L2, amount, secret).await;
    assert!(matches!(result, Err(L2Error::NoSuchL1ToL2Message)));

    // The right path still works.
    h.rollup
        .claim_private(compute_secret_hash(note_secret), amount, secret)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_claim_leaves_funds_escrowed() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;
    let amount = U256::from(100u64);
    let _secret = h.deposit_public_sealed(amount, B256::repeat_byte(0x11)).await;

    let result = h.rollup.claim_public(ALICE_L2, amount, random_secret()).await;
    assert!(matches!(result, Err(L2Error::NoSuchL1ToL2Message)));

    // No refund path: escrow stays put until a correct claim happens.
    assert_eq!(h.portal.escrow_balance().await.unwrap(), amount);
    assert_eq!(h.token.balance_of(ALICE).await.unwrap(), U256::ZERO);
}

#[tokio::test]
async fn test_burn_requires_authorization() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;
    let amount = U256::from(100u64);
    let secret = h.deposit_public_sealed(amount, B256::repeat_byte(0x11)).await;
    h.rollup.claim_public(ALICE_L2, amount, secret).await.unwrap();

    // No authwit registered.
    let result = h
        .rollup
        .exit_to_l1_public(ALICE_L2, ALICE, U256::from(9u64), Address::ZERO, random_secret())
        .await;
    assert!(matches!(result, Err(L2Error::UnauthorizedAction)));
    assert_eq!(h.rollup.public_balance_of(ALICE_L2).await.unwrap(), amount);

    // With authorization the burn amount exactly matches the withdrawal.
    let nonce = random_secret();
    let withdraw = U256::from(9u64);
    h.rollup
        .add_public_authwit(ALICE_L2, burn_public_action_hash(ALICE_L2, withdraw, nonce))
        .await
        .unwrap();
    let (message, block) = h
        .rollup
        .exit_to_l1_public(ALICE_L2, ALICE, withdraw, Address::ZERO, nonce)
        .await
        .unwrap();
    h.rollup.advance_block().await;
    assert_eq!(
        h.rollup.public_balance_of(ALICE_L2).await.unwrap(),
        amount - withdraw
    );

    let witness = h
        .rollup
        .l2_to_l1_membership_witness(block, message.hash())
        .await
        .unwrap();
    let action_id = B256::repeat_byte(0x12);
    h.portal
        .withdraw(
            ALICE,
            ALICE,
            withdraw,
            false,
            block,
            witness.leaf_index,
            witness.path,
            action_id,
            &h.signature(action_id, ALICE),
        )
        .await
        .unwrap();
    assert_eq!(h.token.balance_of(ALICE).await.unwrap(), withdraw);
}

#[tokio::test]
async fn test_resubmitted_withdrawal_proof_is_rejected() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;
    let deposit = U256::from(100u64);
    let withdraw = U256::from(40u64);
    let secret = h.deposit_public_sealed(deposit, B256::repeat_byte(0x11)).await;
    let (message, block) = h.claim_and_exit(deposit, withdraw, secret, Address::ZERO).await;

    let witness = h
        .rollup
        .l2_to_l1_membership_witness(block, message.hash())
        .await
        .unwrap();
    let action_id = B256::repeat_byte(0x12);
    h.portal
        .withdraw(
            ALICE,
            ALICE,
            withdraw,
            false,
            block,
            witness.leaf_index,
            witness.path.clone(),
            action_id,
            &h.signature(action_id, ALICE),
        )
        .await
        .unwrap();
    assert_eq!(h.token.balance_of(ALICE).await.unwrap(), withdraw);

    // Re-presenting the same proof must fail and must not double-pay.
    let again = h
        .portal
        .withdraw(
            ALICE,
            ALICE,
            withdraw,
            false,
            block,
            witness.leaf_index,
            witness.path,
            action_id,
            &h.signature(action_id, ALICE),
        )
        .await;
    assert!(matches!(
        again,
        Err(PortalError::Messaging(MessagingError::AlreadyConsumed))
    ));
    assert_eq!(h.token.balance_of(ALICE).await.unwrap(), withdraw);
}

#[tokio::test]
async fn test_caller_restricted_withdrawal() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;
    let deposit = U256::from(100u64);
    let withdraw = U256::from(40u64);
    let secret = h.deposit_public_sealed(deposit, B256::repeat_byte(0x11)).await;
    // Exit restricted to ALICE as the finalizing caller.
    let (message, block) = h.claim_and_exit(deposit, withdraw, secret, ALICE).await;

    let witness = h
        .rollup
        .l2_to_l1_membership_witness(block, message.hash())
        .await
        .unwrap();
    let action_id = B256::repeat_byte(0x12);

    // Bob cannot finalize: his reconstructed message binds a different
    // caller, so the proof does not match any outbox leaf.
    let bob_attempt = h
        .portal
        .withdraw(
            BOB,
            ALICE,
            withdraw,
            true,
            block,
            witness.leaf_index,
            witness.path.clone(),
            action_id,
            &h.signature(action_id, BOB),
        )
        .await;
    assert!(matches!(
        bob_attempt,
        Err(PortalError::Messaging(MessagingError::InvalidProof))
    ));

    // Alice finalizes.
    h.portal
        .withdraw(
            ALICE,
            ALICE,
            withdraw,
            true,
            block,
            witness.leaf_index,
            witness.path,
            action_id,
            &h.signature(action_id, ALICE),
        )
        .await
        .unwrap();
    assert_eq!(h.token.balance_of(ALICE).await.unwrap(), withdraw);
}

#[tokio::test]
async fn test_public_flow_round_trip_balances() {
    let h = Harness::new();
    let initial = U256::from(1000u64);
    h.fund(ALICE, initial).await;
    let producer = h.rollup.spawn_block_producer(Duration::from_millis(25));

    let report = h
        .orchestrator
        .run_public_flow(FlowParams {
            l1_account: ALICE,
            l2_account: ALICE_L2,
            deposit_amount: U256::from(100u64),
            withdraw_amount: U256::from(9u64),
            action_id: B256::repeat_byte(0x11),
            with_caller: true,
        })
        .await
        .unwrap();
    producer.abort();

    // deposit 100, withdraw 9 → L1 = initial − 100 + 9, L2 keeps 91.
    assert_eq!(
        h.token.balance_of(ALICE).await.unwrap(),
        initial - U256::from(100u64) + U256::from(9u64)
    );
    assert_eq!(
        h.rollup.public_balance_of(ALICE_L2).await.unwrap(),
        U256::from(91u64)
    );
    assert_eq!(h.portal.escrow_balance().await.unwrap(), U256::from(91u64));
    assert!(report.exit_block <= h.rollup.block_number().await.unwrap());
}

#[tokio::test]
async fn test_private_flow_round_trip_balances() {
    let h = Harness::new();
    let initial = U256::from(1000u64);
    h.fund(ALICE, initial).await;
    let producer = h.rollup.spawn_block_producer(Duration::from_millis(25));

    h.orchestrator
        .run_private_flow(FlowParams {
            l1_account: ALICE,
            l2_account: ALICE_L2,
            deposit_amount: U256::from(100u64),
            withdraw_amount: U256::from(9u64),
            action_id: B256::repeat_byte(0x11),
            with_caller: true,
        })
        .await
        .unwrap();
    producer.abort();

    assert_eq!(
        h.token.balance_of(ALICE).await.unwrap(),
        initial - U256::from(100u64) + U256::from(9u64)
    );
    assert_eq!(
        h.rollup.private_balance_of(ALICE_L2).await.unwrap(),
        U256::from(91u64)
    );
}

#[tokio::test]
async fn test_consumability_timeout_without_block_production() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;

    // No block producer: the deposit message is never included, so the
    // orchestrator's wait expires. Operational failure, not a protocol one.
    let orchestrator: HarnessOrchestrator = BridgeOrchestrator::new(
        h.portal.clone(),
        h.rollup.clone(),
        h.attestor.clone(),
        FlowTiming {
            poll_interval: Duration::from_millis(10),
            consumability_timeout: Duration::from_millis(100),
        },
    );

    let result = orchestrator
        .run_public_flow(FlowParams {
            l1_account: ALICE,
            l2_account: ALICE_L2,
            deposit_amount: U256::from(100u64),
            withdraw_amount: U256::from(9u64),
            action_id: B256::repeat_byte(0x11),
            with_caller: false,
        })
        .await;

    assert!(matches!(result, Err(BridgeError::ConsumabilityTimeout(_))));
    // The deposit itself went through; funds stay escrowed.
    assert_eq!(h.portal.escrow_balance().await.unwrap(), U256::from(100u64));
}

#[tokio::test]
async fn test_attestation_denied_user_cannot_deposit() {
    let h = Harness::build(LocalAttestor::random(CIRCUIT_ID).with_denied([ALICE]));
    let initial = U256::from(1000u64);
    h.fund(ALICE, initial).await;

    let result = h
        .orchestrator
        .run_public_flow(FlowParams {
            l1_account: ALICE,
            l2_account: ALICE_L2,
            deposit_amount: U256::from(100u64),
            withdraw_amount: U256::from(9u64),
            action_id: B256::repeat_byte(0x11),
            with_caller: false,
        })
        .await;

    assert!(matches!(result, Err(BridgeError::AttestationDenied)));
    // Fail closed: nothing moved.
    assert_eq!(h.token.balance_of(ALICE).await.unwrap(), initial);
    assert_eq!(h.portal.escrow_balance().await.unwrap(), U256::ZERO);
}

#[tokio::test]
async fn test_verify_signature_semantics() {
    let h = Harness::new();
    let action_id = B256::repeat_byte(0x11);
    let signature = h.signature(action_id, ALICE);

    // True for the trusted key over the exact tuple.
    assert!(h.portal.verify_signature(CIRCUIT_ID, action_id, ALICE, &signature));

    // False, never a panic, for every mismatch.
    assert!(!h.portal.verify_signature(CIRCUIT_ID, action_id, BOB, &signature));
    assert!(!h.portal.verify_signature(CIRCUIT_ID, B256::repeat_byte(0x99), ALICE, &signature));
    assert!(!h.portal.verify_signature(B256::repeat_byte(0x99), action_id, ALICE, &signature));
    assert!(!h.portal.verify_signature(CIRCUIT_ID, action_id, ALICE, &[]));
    assert!(!h.portal.verify_signature(CIRCUIT_ID, action_id, ALICE, &[0xFF; 65]));

    // A signature from a non-trusted key is denied.
    let rogue = LocalAttestor::random(CIRCUIT_ID);
    let rogue_signature = rogue.attest(action_id, ALICE).unwrap().signature;
    assert!(!h.portal.verify_signature(CIRCUIT_ID, action_id, ALICE, &rogue_signature));
}

#[tokio::test]
async fn test_third_party_redeems_on_recipients_behalf() {
    let h = Harness::new();
    h.fund(ALICE, U256::from(100u64)).await;
    let amount = U256::from(100u64);
    let action_id = B256::repeat_byte(0x11);

    // Alice deposits for Bob: the note secret is handed to Bob out of band.
    let consumption_secret = random_secret();
    let note_secret = random_secret();
    h.portal
        .deposit_private(
            ALICE,
            compute_secret_hash(note_secret),
            amount,
            compute_secret_hash(consumption_secret),
            action_id,
            &h.signature(action_id, ALICE),
        )
        .await
        .unwrap();
    h.rollup.advance_block().await;

    // Anyone holding the consumption secret may perform the claim…
    h.rollup
        .claim_private(compute_secret_hash(note_secret), amount, consumption_secret)
        .await
        .unwrap();

    // …and the note secret holder redeems to Bob's L2 account.
    let bob_l2 = B256::repeat_byte(0x04);
    h.rollup.redeem_shield(bob_l2, amount, note_secret).await.unwrap();
    assert_eq!(h.rollup.private_balance_of(bob_l2).await.unwrap(), amount);
}
