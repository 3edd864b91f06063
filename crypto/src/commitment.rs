//! The commitment engine.
//!
//! `commit` hashes an ordered list of fields into a [`Commitment`]. Every field
//! is framed with its length so `["ab", "c"]` and `["a", "bc"]` never collide,
//! and every derivation starts with its own domain tag so a proof hash can
//! never equal a nonce or a nullifier, whatever the other inputs are.

use attest_types::{Commitment, LedgerAddress, Provider, Timestamp};
use blake2::Digest;

use crate::hash::Blake2b256;
use crate::random::EntropySource;
use crate::CryptoError;

/// Domain tags, one per derivation.
pub mod domain {
    pub const PROOF_HASH: &str = "attest/proof-hash/v1";
    pub const NONCE: &str = "attest/nonce/v1";
    pub const NULLIFIER: &str = "attest/nullifier/v1";
}

/// Commit to an ordered list of fields.
pub fn commit(fields: &[&str]) -> Commitment {
    let mut hasher = Blake2b256::new();
    hasher.update((fields.len() as u64).to_le_bytes());
    for field in fields {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    Commitment::new(output)
}

/// Proof hash standing in for a successful identity verification.
///
/// `datum` is the provider's verification datum (for a registry, the profile
/// reference) and `timestamp` the provider-reported submission time.
pub fn proof_hash(
    provider: Provider,
    address: &LedgerAddress,
    datum: &str,
    timestamp: Timestamp,
) -> Commitment {
    let ts = timestamp.as_secs().to_string();
    commit(&[
        domain::PROOF_HASH,
        provider.as_str(),
        address.as_str(),
        datum,
        &ts,
    ])
}

/// Fresh credential nonce from pure randomness.
///
/// No identity material enters the nonce, so correlating a proof hash with a
/// provider's public registry reveals nothing about future nullifiers.
pub fn nonce(entropy: &dyn EntropySource) -> Result<Commitment, CryptoError> {
    let mut seed = [0u8; 32];
    entropy.fill(&mut seed)?;
    Ok(commit(&[domain::NONCE, &hex::encode(seed)]))
}

/// Vote nullifier for a credential nonce on one proposal.
pub fn nullifier(proposal_id: &str, nonce: &Commitment) -> Commitment {
    commit(&[domain::NULLIFIER, proposal_id, &nonce.to_hex()])
}
