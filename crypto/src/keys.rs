//! Ed25519 key generation for holders.

use attest_types::{KeyPair, PrivateKey, PublicKey};
use ed25519_dalek::SigningKey;

use crate::random::{EntropySource, OsEntropy};
use crate::CryptoError;

/// Generate a new Ed25519 key pair from operating-system entropy.
pub fn generate_keypair() -> Result<KeyPair, CryptoError> {
    keypair_from_entropy(&OsEntropy)
}

/// Generate a key pair from an explicit entropy source.
pub fn keypair_from_entropy(entropy: &dyn EntropySource) -> Result<KeyPair, CryptoError> {
    let mut seed = [0u8; 32];
    entropy.fill(&mut seed)?;
    let kp = keypair_from_seed(&seed);
    seed.fill(0);
    Ok(kp)
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Derive a key pair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let signing_key = SigningKey::from_bytes(seed);
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = generate_keypair().unwrap();
        assert_ne!(kp.public.0, [0u8; 32]);
        assert_ne!(kp.private.0, [0u8; 32]);
    }

    #[test]
    fn public_from_private_matches() {
        let kp = generate_keypair().unwrap();
        assert_eq!(public_from_private(&kp.private), kp.public);
    }

    #[test]
    fn keypair_from_seed_deterministic() {
        let kp1 = keypair_from_seed(&[42u8; 32]);
        let kp2 = keypair_from_seed(&[42u8; 32]);
        assert_eq!(kp1.public, kp2.public);
        assert_eq!(kp1.private.0, kp2.private.0);
    }

    #[test]
    fn different_seeds_produce_different_keys() {
        assert_ne!(
            keypair_from_seed(&[1u8; 32]).public,
            keypair_from_seed(&[2u8; 32]).public
        );
    }
}
