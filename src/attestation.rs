use alloy::primitives::{keccak256, Address, Signature, B256};

/// Verifies off-chain-issued compliance attestations.
///
/// An attestation binds `(circuit_id, action_id, user)` under an ECDSA
/// signature from a single trusted attester. The digest is prefixed with the
/// standard EIP-191 personal-sign convention before recovery, matching what
/// off-chain signing tooling produces.
///
/// The trust root is injected at construction so deployments can rotate the
/// attester without touching the verification logic.
#[derive(Debug, Clone, Copy)]
pub struct AttestationVerifier {
    attester: Address,
}

impl AttestationVerifier {
    pub fn new(attester: Address) -> Self {
        Self { attester }
    }

    pub fn attester(&self) -> Address {
        self.attester
    }

    /// digest = keccak256(circuit_id, action_id, user)
    pub fn attestation_digest(circuit_id: B256, action_id: B256, user: Address) -> B256 {
        let mut buf = [0u8; 84];
        buf[..32].copy_from_slice(circuit_id.as_slice());
        buf[32..64].copy_from_slice(action_id.as_slice());
        buf[64..].copy_from_slice(user.as_slice());
        keccak256(buf)
    }

    /// Returns `true` iff `signature` recovers to the trusted attester over
    /// the EIP-191-prefixed digest of `(circuit_id, action_id, user)`.
    ///
    /// Malformed signatures and recovery failures are normal "not verified"
    /// outcomes: this never panics and never errors. Callers must treat
    /// `false` as deny and abort.
    pub fn verify(
        &self,
        circuit_id: B256,
        action_id: B256,
        user: Address,
        signature: &[u8],
    ) -> bool {
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        let digest = Self::attestation_digest(circuit_id, action_id, user);
        match signature.recover_address_from_msg(digest.as_slice()) {
            Ok(recovered) => recovered == self.attester,
            Err(_) => false,
        }
    }
}
