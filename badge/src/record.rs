//! The credential record.

use std::fmt;

use attest_ledger::TransactionId;
use attest_types::{BadgeId, BadgeStatus, Commitment, LedgerAddress, Timestamp, VerificationId};

/// An issued (or in-flight) credential.
///
/// `Debug` redacts the nonce: it is the only value linking a credential to
/// its future votes and must never reach a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: BadgeId,
    pub address: LedgerAddress,
    pub issuer: String,
    pub verification_id: VerificationId,
    pub proof_hash: Commitment,
    pub nonce: Commitment,
    pub created_at: Timestamp,
    /// Ledger height after which the credential is expired.
    pub expires_at_height: u64,
    pub status: BadgeStatus,
    pub transaction_id: Option<TransactionId>,
}

impl CredentialRecord {
    /// Pending for at least `timeout_secs`.
    pub fn is_stale_pending(&self, now: Timestamp, timeout_secs: u64) -> bool {
        self.status == BadgeStatus::Pending && self.created_at.has_expired(timeout_secs, now)
    }

    pub fn is_past_expiry(&self, height: u64) -> bool {
        height > self.expires_at_height
    }

    /// Active and within its validity at `height`.
    pub fn can_vote(&self, height: u64) -> bool {
        self.status == BadgeStatus::Active && !self.is_past_expiry(height)
    }

    pub(crate) fn with_status(&self, status: BadgeStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("issuer", &self.issuer)
            .field("verification_id", &self.verification_id)
            .field("proof_hash", &self.proof_hash)
            .field("nonce", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("expires_at_height", &self.expires_at_height)
            .field("status", &self.status)
            .field("transaction_id", &self.transaction_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: BadgeStatus) -> CredentialRecord {
        CredentialRecord {
            id: BadgeId::from_bytes([1; 16]),
            address: LedgerAddress::parse("addr1").unwrap(),
            issuer: "attest".into(),
            verification_id: VerificationId::from_bytes([2; 16]),
            proof_hash: Commitment::new([3; 32]),
            nonce: Commitment::new([0xAB; 32]),
            created_at: Timestamp::new(1_000),
            expires_at_height: 500,
            status,
            transaction_id: None,
        }
    }

    #[test]
    fn debug_redacts_nonce() {
        let rendered = format!("{:?}", record(BadgeStatus::Active));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&"ab".repeat(32)));
    }

    #[test]
    fn staleness_only_applies_to_pending() {
        assert!(record(BadgeStatus::Pending).is_stale_pending(Timestamp::new(1_300), 300));
        assert!(!record(BadgeStatus::Pending).is_stale_pending(Timestamp::new(1_299), 300));
        assert!(!record(BadgeStatus::Active).is_stale_pending(Timestamp::new(9_999), 300));
    }

    #[test]
    fn voting_requires_active_within_validity() {
        assert!(record(BadgeStatus::Active).can_vote(500));
        assert!(!record(BadgeStatus::Active).can_vote(501));
        assert!(!record(BadgeStatus::Pending).can_vote(10));
    }
}
