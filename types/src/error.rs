//! Parse errors for the shared value types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid ledger address: {0}")]
    InvalidAddress(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("unknown vote choice: {0}")]
    UnknownChoice(String),

    #[error("invalid commitment encoding: {0}")]
    InvalidCommitment(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),
}
