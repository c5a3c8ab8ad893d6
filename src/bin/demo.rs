//! End-to-end demo of the bridge protocol against the in-memory rollup.
//!
//! Run with:
//!   cargo run --bin demo                        # both flows (default)
//!   cargo run --bin demo -- public              # public flow only
//!   cargo run --bin demo -- private             # private flow only
//!   cargo run --bin demo -- --config demo.toml  # ids and timing from file

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use token_bridge::adapters::attestor::{HttpAttestationOracle, LocalAttestor};
use token_bridge::adapters::memory_token::InMemoryTokenLedger;
use token_bridge::adapters::mock_rollup::MockRollup;
use token_bridge::config::BridgeConfig;
use token_bridge::domain::actor::{L1Actor, L2Actor, MESSAGE_VERSION};
use token_bridge::orchestrator::{BridgeOrchestrator, FlowParams, FlowTiming};
use token_bridge::portal::{PortalConfig, TokenPortal};
use token_bridge::ports::rollup::L2Bridge;
use token_bridge::ports::token::TokenLedger;
use token_bridge::server::start_server;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Flow {
    Public,
    Private,
    Both,
}

#[derive(Debug, Parser)]
struct Args {
    /// Which flow variant to run.
    #[arg(value_enum, default_value = "both")]
    flow: Flow,

    /// Bridge config file (actor ids and flow timing). Defaults are used
    /// when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// L2 block production interval.
    #[arg(long, default_value = "250ms")]
    block_time: humantime::Duration,
}

const CHAIN_ID: u64 = 31337;
const DEPOSIT: u64 = 100;
const WITHDRAW: u64 = 9;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    // Actor identities and flow timing, from file or defaults.
    let config = match &args.config {
        Some(path) => Some(BridgeConfig::load(path).context("load bridge config")?),
        None => None,
    };
    let (portal_actor, bridge_actor, timing) = match &config {
        Some(config) => {
            let portal_config = config.portal_config();
            (portal_config.portal, portal_config.l2_bridge, config.flow_timing())
        }
        None => (
            L1Actor::new(Address::repeat_byte(0xA0), CHAIN_ID),
            L2Actor::new(B256::repeat_byte(0xB0), MESSAGE_VERSION),
            FlowTiming::default(),
        ),
    };

    // Trust root: a fresh attestation key served over HTTP. The demo signs
    // locally, so the configured attester address is superseded by this key.
    let circuit_id = config
        .as_ref()
        .map(|c| c.attestation.circuit_id)
        .unwrap_or(B256::repeat_byte(0x77));
    let attestor = Arc::new(LocalAttestor::random(circuit_id));
    let attester = attestor.address();
    let (oracle_addr, oracle_handle) = start_server(attestor, "127.0.0.1:0".parse()?)
        .await
        .context("start attestation service")?;
    let oracle = Arc::new(HttpAttestationOracle::new(format!("http://{oracle_addr}")));

    // L1 side: token ledger and portal.
    let token = Arc::new(InMemoryTokenLedger::new());
    let rollup = Arc::new(MockRollup::new(portal_actor, bridge_actor));
    let portal = Arc::new(TokenPortal::new(
        PortalConfig {
            portal: portal_actor,
            l2_bridge: bridge_actor,
            attester,
            circuit_id,
        },
        token.clone(),
        rollup.clone(),
        rollup.clone(),
    ));

    // L2 side: background block production.
    let producer = rollup.spawn_block_producer(args.block_time.into());

    let alice = Address::repeat_byte(0x01);
    let alice_l2 = B256::repeat_byte(0x02);
    let initial = U256::from(10 * DEPOSIT);
    token.mint(alice, initial).await.context("mint")?;
    token
        .approve(alice, portal_actor.address, initial)
        .await
        .context("approve")?;

    let orchestrator = BridgeOrchestrator::new(portal.clone(), rollup.clone(), oracle, timing);

    let params = FlowParams {
        l1_account: alice,
        l2_account: alice_l2,
        deposit_amount: U256::from(DEPOSIT),
        withdraw_amount: U256::from(WITHDRAW),
        action_id: B256::repeat_byte(0x11),
        with_caller: true,
    };

    if matches!(args.flow, Flow::Public | Flow::Both) {
        info!("=== public flow ===");
        let report = orchestrator
            .run_public_flow(params)
            .await
            .context("public flow")?;
        info!(
            exit_block = report.exit_block,
            l1_balance = %token.balance_of(alice).await.context("balance")?,
            l2_public = %rollup.public_balance_of(alice_l2).await.context("l2 balance")?,
            escrow = %portal.escrow_balance().await.context("escrow")?,
            "public flow complete"
        );
    }

    if matches!(args.flow, Flow::Private | Flow::Both) {
        info!("=== private flow ===");
        let report = orchestrator
            .run_private_flow(FlowParams {
                action_id: B256::repeat_byte(0x12),
                ..params
            })
            .await
            .context("private flow")?;
        info!(
            exit_block = report.exit_block,
            l1_balance = %token.balance_of(alice).await.context("balance")?,
            l2_private = %rollup.private_balance_of(alice_l2).await.context("l2 balance")?,
            escrow = %portal.escrow_balance().await.context("escrow")?,
            "private flow complete"
        );
    }

    producer.abort();
    oracle_handle.abort();
    Ok(())
}
