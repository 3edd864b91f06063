//! Cryptographic primitives for the attest pipeline.
//!
//! - **Blake2b** commitments with domain separation: proof hashes, credential
//!   nonces, vote nullifiers
//! - **OS entropy** for nonces and record identifiers (never a weak fallback)
//! - **Ed25519** for holder proofs of address ownership
//! - Address derivation with `att_` prefix and base32 encoding

pub mod address;
pub mod commitment;
pub mod error;
pub mod hash;
pub mod keys;
pub mod random;
pub mod sign;

pub use address::derive_address;
pub use commitment::{commit, domain, nonce, nullifier, proof_hash};
pub use error::CryptoError;
pub use hash::blake2b_256;
pub use keys::{generate_keypair, keypair_from_entropy, keypair_from_seed, public_from_private};
pub use random::{new_badge_id, new_verification_id, EntropySource, OsEntropy};
pub use sign::{sign_message, verify_signature};
