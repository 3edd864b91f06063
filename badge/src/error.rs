use attest_crypto::CryptoError;
use attest_ledger::LedgerError;
use attest_store::StoreError;
use attest_types::{BadgeStatus, VerificationStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("no credential for address {0}")]
    NotFound(String),

    #[error("verification belongs to {verification}, not {requested}")]
    AddressMismatch {
        verification: String,
        requested: String,
    },

    #[error("verification is {0}, not verified")]
    NotVerified(VerificationStatus),

    #[error("verification has expired")]
    VerificationExpired,

    #[error("address {address} already holds a {status} credential")]
    AlreadyIssued { address: String, status: BadgeStatus },

    #[error("verification {0} already authorized a credential")]
    VerificationConsumed(String),

    #[error("credential for {0} is revoked")]
    Revoked(String),

    #[error("credential is {0} and cannot be renewed")]
    NotRenewable(BadgeStatus),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
