//! Standalone attestation service.
//!
//! Generates a fresh signing key, prints the attester address to configure
//! the portal with, and serves attestations until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use alloy::primitives::B256;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use token_bridge::adapters::attestor::LocalAttestor;
use token_bridge::server::start_server;

#[derive(Debug, Parser)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8581")]
    listen: SocketAddr,

    /// Circuit identifier attestations are issued for (32-byte hex).
    #[arg(long, default_value = "0x0000000000000000000000000000000000000000000000000000000000000077")]
    circuit_id: B256,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let attestor = Arc::new(LocalAttestor::random(args.circuit_id));
    info!(attester = %attestor.address(), circuit_id = %attestor.circuit_id(), "attestor key generated");

    let (bound, handle) = start_server(attestor, args.listen)
        .await
        .context("start attestation service")?;
    info!(%bound, "serving attestations");

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    handle.abort();
    Ok(())
}
