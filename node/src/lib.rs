//! The attest node: request orchestration for the verification, badge and
//! vote pipeline.
//!
//! The node is the central coordinator that:
//! - Sequences verification submission and credential issuance end to end
//! - Derives vote nullifiers and submits votes through the ledger bridge
//! - Authenticates holders through a configured signature verifier
//! - Enforces per-route request budgets
//! - Loads TOML configuration, installs logging, and owns the Prometheus registry

pub mod admission;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod shutdown;
pub mod signature;
pub mod tracing_spans;

pub use admission::{AdmissionControl, Budget, RateLimiter, Route};
pub use config::{LedgerConfig, LimitsConfig, NodeConfig, ProvidersConfig};
pub use error::{ErrorKind, NodeError, PipelineError};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use pipeline::{Collaborators, Health, Pipeline, Tally, VoteReceipt};
pub use shutdown::ShutdownController;
pub use signature::{
    messages, AcceptAll, Ed25519Verifier, HolderProof, SignatureMode, SignatureVerifier,
};
