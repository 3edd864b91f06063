//! Verification registry.
//!
//! Accepts a proof of humanity from an external identity provider, turns it
//! into a one-way proof hash, and keeps at most one live verified record per
//! ledger address.

pub mod error;
pub mod provider;
pub mod record;
pub mod registry;

pub use error::VerificationError;
pub use provider::{HttpRegistryProvider, IdentityProvider, ProfileReference, ProviderCheck};
pub use record::VerificationRecord;
pub use registry::{SubmitOutcome, VerificationRegistry, DEFAULT_PROVIDER_TIMEOUT};
