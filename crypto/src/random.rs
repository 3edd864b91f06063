//! Secure randomness for nonces and record identifiers.

use attest_types::{BadgeId, VerificationId};

use crate::CryptoError;

/// A source of cryptographically secure random bytes.
///
/// Implementations must return an error rather than degrade: there is no
/// weak fallback anywhere in the pipeline.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// Operating-system randomness via `getrandom`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(buf).map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))
    }
}

/// Mint a fresh verification identifier.
pub fn new_verification_id(entropy: &dyn EntropySource) -> Result<VerificationId, CryptoError> {
    let mut bytes = [0u8; 16];
    entropy.fill(&mut bytes)?;
    Ok(VerificationId::from_bytes(bytes))
}

/// Mint a fresh credential identifier.
pub fn new_badge_id(entropy: &dyn EntropySource) -> Result<BadgeId, CryptoError> {
    let mut bytes = [0u8; 16];
    entropy.fill(&mut bytes)?;
    Ok(BadgeId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl EntropySource for Broken {
        fn fill(&self, _buf: &mut [u8]) -> Result<(), CryptoError> {
            Err(CryptoError::EntropyUnavailable("device gone".into()))
        }
    }

    #[test]
    fn os_entropy_fills_buffer() {
        let mut buf = [0u8; 32];
        OsEntropy.fill(&mut buf).unwrap();
        assert_ne!(buf, [0u8; 32]);
    }

    #[test]
    fn broken_source_fails_loudly() {
        assert!(new_verification_id(&Broken).is_err());
        assert!(crate::nonce(&Broken).is_err());
    }

    #[test]
    fn ids_are_distinct() {
        let a = new_badge_id(&OsEntropy).unwrap();
        let b = new_badge_id(&OsEntropy).unwrap();
        assert_ne!(a, b);
    }
}
