//! Nullable entropy: deterministic byte streams.

use attest_crypto::{CryptoError, EntropySource};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A deterministic entropy source for testing.
///
/// Every call yields a distinct buffer derived from a counter, so minted ids
/// and nonces stay unique without being random. Can be switched off to
/// exercise the "no randomness, fail loudly" path.
pub struct NullEntropy {
    counter: AtomicU64,
    unavailable: AtomicBool,
}

impl NullEntropy {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl Default for NullEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for NullEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CryptoError::EntropyUnavailable("null entropy switched off".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst).to_le_bytes();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = n[i % n.len()] ^ (i as u8);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_fills_differ() {
        let entropy = NullEntropy::new();
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        entropy.fill(&mut a).unwrap();
        entropy.fill(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn can_be_switched_off() {
        let entropy = NullEntropy::new();
        entropy.set_unavailable(true);
        assert!(entropy.fill(&mut [0u8; 8]).is_err());
    }
}
