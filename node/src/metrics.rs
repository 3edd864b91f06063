//! Prometheus metrics for the attest node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_gauge_with_registry, Encoder,
    IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::NodeError;

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Verification submissions by resulting status (`verified`, `rejected`, `reused`, `error`).
    pub verifications_total: IntCounterVec,
    /// Issuance requests by outcome (`active`, `conflict`, `failed`, `pending`, `invalid`).
    pub issuance_total: IntCounterVec,
    /// Vote submissions by outcome (`accepted`, `already_voted`, `error`).
    pub votes_total: IntCounterVec,
    /// Requests refused by admission control, by route budget.
    pub rate_limited_total: IntCounterVec,

    /// Last ledger height observed by a health check.
    pub ledger_height: IntGauge,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let verifications_total = register_int_counter_vec_with_registry!(
            Opts::new(
                "attest_verifications_total",
                "Verification submissions by resulting status"
            ),
            &["status"],
            registry
        )
        .expect("failed to register verifications_total counter");

        let issuance_total = register_int_counter_vec_with_registry!(
            Opts::new("attest_issuance_total", "Credential issuance requests by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register issuance_total counter");

        let votes_total = register_int_counter_vec_with_registry!(
            Opts::new("attest_votes_total", "Vote submissions by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register votes_total counter");

        let rate_limited_total = register_int_counter_vec_with_registry!(
            Opts::new(
                "attest_rate_limited_total",
                "Requests refused by admission control"
            ),
            &["route"],
            registry
        )
        .expect("failed to register rate_limited_total counter");

        let ledger_height = register_int_gauge_with_registry!(
            Opts::new("attest_ledger_height", "Last observed ledger height"),
            registry
        )
        .expect("failed to register ledger_height gauge");

        Self {
            registry,
            verifications_total,
            issuance_total,
            votes_total,
            rate_limited_total,
            ledger_height,
        }
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| NodeError::Other(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = NodeMetrics::new();
        metrics
            .issuance_total
            .with_label_values(&["active"])
            .inc();
        metrics.ledger_height.set(1_234);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("attest_issuance_total{outcome=\"active\"} 1"));
        assert!(text.contains("attest_ledger_height 1234"));
    }
}
