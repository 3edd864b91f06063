//! Issuance parameters shared by the registries.

use serde::{Deserialize, Serialize};

/// Lifetimes and thresholds for verifications and credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceParams {
    /// How long a verified verification stays usable for issuance (wall-clock seconds).
    pub verification_ttl_secs: u64,

    /// Credential lifetime in ledger blocks from the issuance height.
    pub badge_validity_blocks: u64,

    /// Age (seconds) after which a `pending` credential is reconciled against the ledger.
    pub pending_timeout_secs: u64,

    /// Identity of the issuing authority, copied into every credential.
    pub issuer: String,
}

impl Default for IssuanceParams {
    fn default() -> Self {
        Self {
            verification_ttl_secs: 24 * 3600,
            badge_validity_blocks: 1_000_000,
            pending_timeout_secs: 300,
            issuer: "attest".to_string(),
        }
    }
}
