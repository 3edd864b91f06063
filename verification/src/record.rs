//! The verification record.

use attest_types::{
    Commitment, LedgerAddress, Provider, Timestamp, VerificationId, VerificationStatus,
};
use serde::{Deserialize, Serialize};

/// One verification attempt.
///
/// Records are never deleted; an expired record stays for audit but no longer
/// authorizes issuance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub id: VerificationId,
    pub address: LedgerAddress,
    pub provider: Provider,
    pub status: VerificationStatus,
    pub proof_hash: Commitment,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    /// Opaque audit payload as received from the client.
    pub provider_data: serde_json::Value,
}

impl VerificationRecord {
    /// Verified and not yet past `expires_at`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.status == VerificationStatus::Verified && now <= self.expires_at
    }

    /// Verified in storage but past `expires_at`, awaiting the lazy flip.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        self.status == VerificationStatus::Verified && now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: VerificationStatus) -> VerificationRecord {
        VerificationRecord {
            id: VerificationId::from_bytes([1; 16]),
            address: LedgerAddress::parse("addr1").unwrap(),
            provider: Provider::HumanityRegistry,
            status,
            proof_hash: Commitment::new([2; 32]),
            created_at: Timestamp::new(100),
            expires_at: Timestamp::new(200),
            provider_data: serde_json::Value::Null,
        }
    }

    #[test]
    fn liveness_is_inclusive_of_expiry_instant() {
        let r = record(VerificationStatus::Verified);
        assert!(r.is_live(Timestamp::new(200)));
        assert!(!r.is_live(Timestamp::new(201)));
        assert!(r.is_stale(Timestamp::new(201)));
    }

    #[test]
    fn rejected_is_never_live() {
        let r = record(VerificationStatus::Rejected);
        assert!(!r.is_live(Timestamp::new(150)));
        assert!(!r.is_stale(Timestamp::new(250)));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(record(VerificationStatus::Verified)).unwrap();
        assert_eq!(json["status"], "verified");
        assert_eq!(json["provider"], "humanity-registry");
        assert!(json.get("proofHash").is_some());
        assert!(json.get("expiresAt").is_some());
    }
}
