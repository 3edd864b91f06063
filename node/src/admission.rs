//! Per-route request budgets.
//!
//! Each budget is a fixed window per key: at most `max_requests` within
//! `window_secs` of the window's first request. Exceeding it fails fast with
//! a rate-limited error carrying the seconds until the window resets;
//! requests are never queued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use attest_types::{Clock, LedgerAddress, Timestamp};
use serde::{Deserialize, Serialize};

use crate::metrics::NodeMetrics;
use crate::PipelineError;

/// Windows are pruned once this many keys are tracked.
const PRUNE_THRESHOLD: usize = 10_000;

/// A request ceiling per window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Budget {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Which budget a request is charged against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Default,
    Verification,
    Issuance,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Default => "default",
            Route::Verification => "verification",
            Route::Issuance => "issuance",
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Window {
    started: Timestamp,
    count: u32,
}

/// Fixed-window limiter over arbitrary string keys.
pub struct RateLimiter {
    budget: Budget,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(budget: Budget, clock: Arc<dyn Clock>) -> Self {
        Self {
            budget,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Charge one request to `key`.
    ///
    /// Returns the seconds until the window resets when the budget is spent.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let now = self.clock.now();
        let window_secs = self.budget.window_secs;
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, w| !w.started.has_expired(window_secs, now));
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if window.started.has_expired(window_secs, now) {
            *window = Window {
                started: now,
                count: 0,
            };
        }
        if window.count >= self.budget.max_requests {
            let resets_at = window.started.plus_secs(window_secs);
            return Err(resets_at.as_secs().saturating_sub(now.as_secs()).max(1));
        }
        window.count += 1;
        Ok(())
    }
}

/// The three budgets of the HTTP surface.
///
/// - default: every request, keyed by client
/// - verification: verification submissions, keyed by client and address
/// - issuance: issuance requests, keyed by client
pub struct AdmissionControl {
    default: RateLimiter,
    verification: RateLimiter,
    issuance: RateLimiter,
    metrics: Arc<NodeMetrics>,
}

impl AdmissionControl {
    pub fn new(
        default: Budget,
        verification: Budget,
        issuance: Budget,
        clock: Arc<dyn Clock>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            default: RateLimiter::new(default, clock.clone()),
            verification: RateLimiter::new(verification, clock.clone()),
            issuance: RateLimiter::new(issuance, clock),
            metrics,
        }
    }

    pub fn check_default(&self, client: &str) -> Result<(), PipelineError> {
        self.charge(Route::Default, &self.default, client)
    }

    pub fn check_verification(
        &self,
        client: &str,
        address: &LedgerAddress,
    ) -> Result<(), PipelineError> {
        let key = format!("{client}|{address}");
        self.charge(Route::Verification, &self.verification, &key)
    }

    pub fn check_issuance(&self, client: &str) -> Result<(), PipelineError> {
        self.charge(Route::Issuance, &self.issuance, client)
    }

    fn charge(&self, route: Route, limiter: &RateLimiter, key: &str) -> Result<(), PipelineError> {
        limiter.check(key).map_err(|retry_after| {
            self.metrics
                .rate_limited_total
                .with_label_values(&[route.as_str()])
                .inc();
            tracing::debug!(route = route.as_str(), retry_after, "request budget exhausted");
            PipelineError::rate_limited(retry_after)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct TestClock(AtomicU64);

    impl Clock for TestClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0.load(Ordering::SeqCst))
        }
    }

    fn limiter(max: u32, window: u64) -> (Arc<TestClock>, RateLimiter) {
        let clock = Arc::new(TestClock(AtomicU64::new(1_000)));
        (clock.clone(), RateLimiter::new(Budget::new(max, window), clock))
    }

    #[test]
    fn budget_exhausts_then_resets() {
        let (clock, limiter) = limiter(3, 3_600);
        for _ in 0..3 {
            assert!(limiter.check("client").is_ok());
        }
        assert_eq!(limiter.check("client"), Err(3_600));

        clock.0.store(1_000 + 3_000, Ordering::SeqCst);
        assert_eq!(limiter.check("client"), Err(600));

        clock.0.store(1_000 + 3_600, Ordering::SeqCst);
        assert!(limiter.check("client").is_ok());
    }

    #[test]
    fn keys_are_independent() {
        let (_, limiter) = limiter(1, 60);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        assert!(limiter.check("a").is_err());
    }

    #[test]
    fn verification_budget_is_keyed_by_client_and_address() {
        let clock = Arc::new(TestClock(AtomicU64::new(0)));
        let metrics = Arc::new(NodeMetrics::new());
        let admission = AdmissionControl::new(
            Budget::new(100, 900),
            Budget::new(1, 900),
            Budget::new(3, 3_600),
            clock,
            metrics.clone(),
        );
        let a1 = LedgerAddress::parse("addr1").unwrap();
        let a2 = LedgerAddress::parse("addr2").unwrap();
        assert!(admission.check_verification("10.0.0.1", &a1).is_ok());
        assert!(admission.check_verification("10.0.0.1", &a2).is_ok());

        let err = admission.check_verification("10.0.0.1", &a1).unwrap_err();
        assert_eq!(err.retry_after_secs, Some(900));
        assert_eq!(
            metrics
                .rate_limited_total
                .with_label_values(&["verification"])
                .get(),
            1
        );
    }
}
