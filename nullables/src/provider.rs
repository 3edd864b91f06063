//! Nullable identity provider: scripted registry answers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use attest_types::{Provider, Timestamp};
use attest_verification::{IdentityProvider, ProfileReference, ProviderCheck, VerificationError};

/// A scripted identity provider.
///
/// Profiles registered with [`NullIdentityProvider::register`] verify; every
/// other profile comes back as not registered. Can be taken down or slowed to
/// exercise the retryable failure paths.
pub struct NullIdentityProvider {
    provider: Provider,
    registered: Mutex<HashMap<String, Option<Timestamp>>>,
    down: Mutex<bool>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl NullIdentityProvider {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            registered: Mutex::new(HashMap::new()),
            down: Mutex::new(false),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mark a profile as registered, optionally with a submission time.
    pub fn register(&self, profile: &str, submission_time: Option<Timestamp>) {
        self.registered
            .lock()
            .unwrap()
            .insert(profile.to_string(), submission_time);
    }

    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Number of verify calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for NullIdentityProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn verify(&self, profile: &ProfileReference) -> Result<ProviderCheck, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.down.lock().unwrap() {
            return Err(VerificationError::ProviderUnavailable {
                provider: self.provider,
                reason: "null provider down".into(),
            });
        }
        let entry = self.registered.lock().unwrap().get(profile.as_str()).copied();
        Ok(ProviderCheck {
            registered: entry.is_some(),
            submission_time: entry.flatten(),
            datum: profile.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_answers() {
        let provider = NullIdentityProvider::new(Provider::HumanityRegistry);
        provider.register("alice", Some(Timestamp::new(7)));

        let alice = ProfileReference::parse("alice").unwrap();
        let check = provider.verify(&alice).await.unwrap();
        assert!(check.registered);
        assert_eq!(check.submission_time, Some(Timestamp::new(7)));

        let bob = ProfileReference::parse("bob").unwrap();
        assert!(!provider.verify(&bob).await.unwrap().registered);

        provider.set_down(true);
        assert!(provider.verify(&alice).await.unwrap_err().is_retryable());
        assert_eq!(provider.calls(), 3);
    }
}
