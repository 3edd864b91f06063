//! Authorization of an issuance by a verification.

use attest_types::{Commitment, LedgerAddress, Timestamp, VerificationId, VerificationStatus};
use attest_verification::VerificationRecord;

use crate::BadgeError;

/// Proof that a verified, unexpired verification belonging to `address`
/// authorized this issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuanceGrant {
    pub verification_id: VerificationId,
    pub address: LedgerAddress,
    pub proof_hash: Commitment,
}

impl IssuanceGrant {
    pub fn authorize(
        verification: &VerificationRecord,
        address: &LedgerAddress,
        now: Timestamp,
    ) -> Result<Self, BadgeError> {
        if &verification.address != address {
            return Err(BadgeError::AddressMismatch {
                verification: verification.address.to_string(),
                requested: address.to_string(),
            });
        }
        match verification.status {
            VerificationStatus::Expired => return Err(BadgeError::VerificationExpired),
            VerificationStatus::Verified => {}
            other => return Err(BadgeError::NotVerified(other)),
        }
        if now > verification.expires_at {
            return Err(BadgeError::VerificationExpired);
        }
        Ok(Self {
            verification_id: verification.id.clone(),
            address: address.clone(),
            proof_hash: verification.proof_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_types::Provider;

    fn verification(status: VerificationStatus) -> VerificationRecord {
        VerificationRecord {
            id: VerificationId::from_bytes([1; 16]),
            address: LedgerAddress::parse("addr2").unwrap(),
            provider: Provider::HumanityRegistry,
            status,
            proof_hash: Commitment::new([4; 32]),
            created_at: Timestamp::new(0),
            expires_at: Timestamp::new(100),
            provider_data: serde_json::Value::Null,
        }
    }

    #[test]
    fn grants_for_matching_live_verification() {
        let v = verification(VerificationStatus::Verified);
        let grant = IssuanceGrant::authorize(&v, &v.address, Timestamp::new(50)).unwrap();
        assert_eq!(grant.proof_hash, v.proof_hash);
    }

    #[test]
    fn address_mismatch() {
        let v = verification(VerificationStatus::Verified);
        let err = IssuanceGrant::authorize(
            &v,
            &LedgerAddress::parse("addr1").unwrap(),
            Timestamp::new(50),
        )
        .unwrap_err();
        assert!(matches!(err, BadgeError::AddressMismatch { .. }));
    }

    #[test]
    fn expired_verification() {
        let v = verification(VerificationStatus::Verified);
        let err = IssuanceGrant::authorize(&v, &v.address, Timestamp::new(101)).unwrap_err();
        assert_eq!(err.to_string(), "verification has expired");

        let v = verification(VerificationStatus::Expired);
        let err = IssuanceGrant::authorize(&v, &v.address, Timestamp::new(0)).unwrap_err();
        assert!(matches!(err, BadgeError::VerificationExpired));
    }

    #[test]
    fn rejected_verification() {
        let v = verification(VerificationStatus::Rejected);
        let err = IssuanceGrant::authorize(&v, &v.address, Timestamp::new(50)).unwrap_err();
        assert!(matches!(err, BadgeError::NotVerified(VerificationStatus::Rejected)));
    }
}
