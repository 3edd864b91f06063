//! HTTP API for the attest node.
//!
//! Provides endpoints for:
//! - Verification submission and status
//! - Badge issuance, status and renewal
//! - Vote casting and tallies
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, AppState, ClientKey, RpcServer};
