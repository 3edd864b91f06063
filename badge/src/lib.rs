//! Credential (badge) registry.
//!
//! Issues at most one live credential per ledger address, each authorized by
//! exactly one verified, unexpired verification. The uniqueness claim and the
//! insertion of the `pending` record happen in one critical section per
//! address; the ledger is consulted afterwards and has the final word.

pub mod error;
pub mod grant;
pub mod record;
pub mod registry;

pub use error::BadgeError;
pub use grant::IssuanceGrant;
pub use record::CredentialRecord;
pub use registry::CredentialRegistry;
