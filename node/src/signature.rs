//! Holder authentication.
//!
//! Operations acting on behalf of an address carry a [`HolderProof`]: the
//! holder's Ed25519 public key and a signature over a canonical message. The
//! [`SignatureVerifier`] implementation is chosen once, at construction.

use std::sync::Arc;

use attest_crypto::{derive_address, verify_signature};
use attest_types::{LedgerAddress, PublicKey, Signature, VerificationId, VoteChoice};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Hex-encoded public key and signature supplied with a request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderProof {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Canonical messages a holder signs.
pub mod messages {
    use super::*;

    pub fn issue(address: &LedgerAddress, verification_id: &VerificationId) -> String {
        format!("attest:issue:{address}:{verification_id}")
    }

    pub fn renew(address: &LedgerAddress) -> String {
        format!("attest:renew:{address}")
    }

    pub fn vote(address: &LedgerAddress, proposal_id: &str, choice: VoteChoice) -> String {
        format!("attest:vote:{address}:{proposal_id}:{choice}")
    }
}

/// Checks that the caller controls `address`.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        address: &LedgerAddress,
        message: &str,
        proof: &HolderProof,
    ) -> Result<(), PipelineError>;
}

/// Accepts every request. For fixtures and development deployments.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _: &LedgerAddress, _: &str, _: &HolderProof) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Requires the address to be derived from the supplied public key and the
/// signature over the canonical message to verify under it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        address: &LedgerAddress,
        message: &str,
        proof: &HolderProof,
    ) -> Result<(), PipelineError> {
        let (Some(pk_hex), Some(sig_hex)) = (&proof.public_key, &proof.signature) else {
            return Err(PipelineError::validation("missing holder public key or signature"));
        };
        let public_key = PublicKey::from_hex(pk_hex)?;
        let signature = Signature::from_hex(sig_hex)?;

        if derive_address(&public_key)? != *address {
            return Err(PipelineError::validation("public key does not control this address"));
        }
        if !verify_signature(message.as_bytes(), &signature, &public_key) {
            return Err(PipelineError::validation("invalid holder signature"));
        }
        Ok(())
    }
}

/// How holder proofs are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureMode {
    Ed25519,
    AcceptAll,
}

impl SignatureMode {
    pub fn verifier(&self) -> Arc<dyn SignatureVerifier> {
        match self {
            SignatureMode::Ed25519 => Arc::new(Ed25519Verifier),
            SignatureMode::AcceptAll => Arc::new(AcceptAll),
        }
    }
}
