//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, entropy, ledger, identity providers) are
//! abstracted behind traits. This crate provides test-friendly implementations
//! that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod provider;
pub mod random;

pub use clock::NullClock;
pub use ledger::{LedgerFault, NullLedger};
pub use provider::NullIdentityProvider;
pub use random::NullEntropy;
