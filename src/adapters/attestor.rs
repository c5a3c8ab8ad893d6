use std::collections::HashSet;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use tracing::warn;

use crate::attestation::AttestationVerifier;
use crate::ports::attestation::{Attestation, AttestationOracle, OracleError};

/// Attestation issuer backed by a local ECDSA key.
///
/// This is the signing half of the trust relationship: the portal's
/// verifier holds this signer's address as its trust root. Used directly as
/// an in-process oracle in tests and behind the HTTP service otherwise.
pub struct LocalAttestor {
    signer: PrivateKeySigner,
    circuit_id: B256,
    /// Subjects that fail the uniqueness check.
    denied: HashSet<Address>,
}

impl LocalAttestor {
    pub fn new(signer: PrivateKeySigner, circuit_id: B256) -> Self {
        Self {
            signer,
            circuit_id,
            denied: HashSet::new(),
        }
    }

    /// Fresh attestor with a random key.
    pub fn random(circuit_id: B256) -> Self {
        Self::new(PrivateKeySigner::random(), circuit_id)
    }

    /// Mark subjects as non-unique; attestations for them come back denied.
    pub fn with_denied(mut self, denied: impl IntoIterator<Item = Address>) -> Self {
        self.denied.extend(denied);
        self
    }

    /// The trusted attester address the portal should be configured with.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn circuit_id(&self) -> B256 {
        self.circuit_id
    }

    /// Issue an attestation for `(action_id, user)`. Denied subjects get
    /// `is_unique: false` and an empty signature.
    pub fn attest(&self, action_id: B256, user: Address) -> Result<Attestation, OracleError> {
        if self.denied.contains(&user) {
            return Ok(Attestation {
                is_unique: false,
                signature: Bytes::new(),
                circuit_id: self.circuit_id,
            });
        }
        let digest = AttestationVerifier::attestation_digest(self.circuit_id, action_id, user);
        let signature = self
            .signer
            .sign_message_sync(digest.as_slice())
            .map_err(|e| OracleError::Signer(e.to_string()))?;
        Ok(Attestation {
            is_unique: true,
            signature: Bytes::copy_from_slice(&signature.as_bytes()),
            circuit_id: self.circuit_id,
        })
    }
}

impl AttestationOracle for LocalAttestor {
    async fn fetch_attestation(
        &self,
        action_id: B256,
        user: Address,
    ) -> Result<Attestation, OracleError> {
        self.attest(action_id, user)
    }
}

/// HTTP client for the attestation service.
///
/// Transport failures are retried with exponential backoff before
/// surfacing as `Unavailable`; a denied attestation is returned as-is and
/// never retried.
pub struct HttpAttestationOracle {
    client: reqwest::Client,
    base_url: String,
    attempts: u32,
    initial_backoff: Duration,
}

impl HttpAttestationOracle {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            attempts: 3,
            initial_backoff: Duration::from_millis(250),
        }
    }

    async fn request(&self, action_id: B256, user: Address) -> Result<Attestation, OracleError> {
        let response = self
            .client
            .post(format!("{}/attest", self.base_url))
            .json(&serde_json::json!({ "action_id": action_id, "user": user }))
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(OracleError::Unavailable(format!(
                "attestation service returned {}",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(OracleError::InvalidResponse(format!(
                "attestation service returned {}",
                response.status()
            )));
        }
        response
            .json::<Attestation>()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }
}

impl AttestationOracle for HttpAttestationOracle {
    async fn fetch_attestation(
        &self,
        action_id: B256,
        user: Address,
    ) -> Result<Attestation, OracleError> {
        let mut backoff = self.initial_backoff;
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match self.request(action_id, user).await {
                Ok(attestation) => return Ok(attestation),
                // Only transport-level failures are retryable.
                Err(OracleError::Unavailable(reason)) => {
                    warn!(attempt, %reason, "attestation fetch failed, retrying");
                    last_err = Some(OracleError::Unavailable(reason));
                    if attempt < self.attempts {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(last_err.unwrap_or_else(|| OracleError::Unavailable("no attempts made".into())))
    }
}
