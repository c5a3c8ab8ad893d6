use std::future::Future;

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A signed compliance assertion from the off-chain attestation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    /// Whether the subject passed the uniqueness check. `false` means deny;
    /// the signature field is empty in that case.
    pub is_unique: bool,
    /// ECDSA signature over `(circuit_id, action_id, user)`.
    pub signature: Bytes,
    /// Circuit the attestation was issued for.
    pub circuit_id: B256,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("attestation service unreachable: {0}")]
    Unavailable(String),

    #[error("malformed attestation response: {0}")]
    InvalidResponse(String),

    #[error("attestation signing failed: {0}")]
    Signer(String),
}

/// Port for the off-chain attestation oracle.
///
/// The oracle is a trusted collaborator; transport failures are the only
/// thing implementations may retry. A negative attestation is a protocol
/// denial and must be surfaced as-is.
pub trait AttestationOracle: Send + Sync {
    fn fetch_attestation(
        &self,
        action_id: B256,
        user: Address,
    ) -> impl Future<Output = Result<Attestation, OracleError>> + Send;
}
