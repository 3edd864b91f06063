//! State enums for verifications, credentials, providers, and votes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Status of a verification attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Created, provider check not yet concluded.
    Pending,
    /// Provider confirmed the identity claim.
    Verified,
    /// Provider did not confirm the identity claim.
    Rejected,
    /// Was verified, but read after its expiry.
    Expired,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an issued credential (badge).
///
/// `none → pending → {active, failed}`; `active → {expired, revoked}`;
/// `failed → pending` on retry; `expired → active` on renewal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStatus {
    /// Uniqueness slot claimed, ledger transaction not yet confirmed.
    Pending,
    /// Confirmed on the ledger.
    Active,
    /// Read past its expiry height.
    Expired,
    /// Revoked by administrative action. Terminal.
    Revoked,
    /// Ledger rejected or was unreachable; slot released.
    Failed,
}

impl BadgeStatus {
    /// Whether a credential in this status holds the per-address uniqueness slot.
    pub fn holds_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BadgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External identity provider families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// Public humanity-proof registry (profile lookup).
    HumanityRegistry,
    /// Biometric uniqueness service.
    BiometricUniqueness,
    /// Liveness check.
    Liveness,
    /// Social-graph vouching.
    SocialGraph,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::HumanityRegistry,
        Provider::BiometricUniqueness,
        Provider::Liveness,
        Provider::SocialGraph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HumanityRegistry => "humanity-registry",
            Self::BiometricUniqueness => "biometric-uniqueness",
            Self::Liveness => "liveness",
            Self::SocialGraph => "social-graph",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| TypesError::UnknownProvider(s.to_string()))
    }
}

/// A ballot choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

impl VoteChoice {
    pub const ALL: [VoteChoice; 3] = [VoteChoice::Yes, VoteChoice::No, VoteChoice::Abstain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Abstain => "abstain",
        }
    }

    /// Encoding used as a ledger transition input.
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Yes => 0,
            Self::No => 1,
            Self::Abstain => 2,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteChoice {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoteChoice::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| TypesError::UnknownChoice(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_and_active_hold_the_slot() {
        assert!(BadgeStatus::Pending.holds_slot());
        assert!(BadgeStatus::Active.holds_slot());
        assert!(!BadgeStatus::Failed.holds_slot());
        assert!(!BadgeStatus::Expired.holds_slot());
        assert!(!BadgeStatus::Revoked.holds_slot());
    }

    #[test]
    fn provider_round_trips_through_path_form() {
        for p in Provider::ALL {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
        assert!("worldcoin".parse::<Provider>().is_err());
    }

    #[test]
    fn provider_serde_matches_path_form() {
        let json = serde_json::to_string(&Provider::HumanityRegistry).unwrap();
        assert_eq!(json, "\"humanity-registry\"");
    }
}
