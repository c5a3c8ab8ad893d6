//! End-to-end harness for a token bridge between an Ethereum-style base
//! layer ("L1") and a rollup ("L2").
//!
//! The crate is split hexagonally:
//!
//! - [`domain`] holds the pure protocol types: cross-chain actors, messages,
//!   message Merkle trees, and shield notes.
//! - [`ports`] declares traits for every external collaborator: the escrowed
//!   token ledger, the rollup's inbox/outbox messaging primitives, the rollup
//!   node, the L2 bridge contract, and the off-chain attestation oracle.
//! - [`portal`] is the L1-side portal: attestation-gated escrow plus message
//!   emission on deposit, and consume-then-release on withdrawal.
//! - [`orchestrator`] sequences the full deposit → claim → burn → withdraw
//!   flow across both layers, with polling guards and timeouts.
//! - [`adapters`] provides the in-memory token ledger and mock rollup the
//!   harness runs against, plus the attestation signer and HTTP client.
//! - [`server`] exposes the attestation oracle over HTTP.

pub mod adapters;
pub mod attestation;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod orchestrator;
pub mod portal;
pub mod ports;
pub mod server;
