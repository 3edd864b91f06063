//! Fundamental types for the attest pipeline.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! ledger addresses, commitments, record identifiers, timestamps and clocks,
//! issuance parameters, and the status enums for verifications and credentials.

pub mod address;
pub mod error;
pub mod hash;
pub mod ids;
pub mod keys;
pub mod params;
pub mod state;
pub mod time;

pub use address::LedgerAddress;
pub use error::TypesError;
pub use hash::Commitment;
pub use ids::{BadgeId, VerificationId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::IssuanceParams;
pub use state::{BadgeStatus, Provider, VerificationStatus, VoteChoice};
pub use time::{Clock, SystemClock, Timestamp};
