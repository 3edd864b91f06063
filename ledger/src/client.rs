//! The raw ledger contract.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// A program function call submitted to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub program: String,
    pub function: String,
    pub inputs: Vec<String>,
    pub fee: u64,
}

/// Ledger reference for a submitted transition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Submit / read / height access to the external ledger.
///
/// Implementations do not retry; classification of failures into retryable
/// and terminal happens through [`LedgerError`].
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn submit(&self, transition: Transition) -> Result<TransactionId, LedgerError>;

    /// Raw value stored under `key`, or `None` when the key is absent.
    async fn read_mapping(
        &self,
        program: &str,
        mapping: &str,
        key: &str,
    ) -> Result<Option<String>, LedgerError>;

    async fn current_height(&self) -> Result<u64, LedgerError>;
}
