//! Ledger account identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// An account identifier on the external ledger.
///
/// The pipeline treats addresses as opaque, but rejects anything that could
/// not be a ledger account before it reaches a registry: empty strings,
/// whitespace, and characters outside `[A-Za-z0-9_]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LedgerAddress(String);

impl LedgerAddress {
    /// Longest address accepted by [`LedgerAddress::parse`].
    pub const MAX_LEN: usize = 128;

    /// Parse and validate an address string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.is_empty() || s.len() > Self::MAX_LEN {
            return Err(TypesError::InvalidAddress(s));
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(TypesError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LedgerAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for LedgerAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(LedgerAddress::parse("addr1").is_ok());
        assert!(LedgerAddress::parse("att_1xyz").is_ok());
    }

    #[test]
    fn rejects_malformed() {
        assert!(LedgerAddress::parse("").is_err());
        assert!(LedgerAddress::parse("addr 1").is_err());
        assert!(LedgerAddress::parse("addr/1").is_err());
        assert!(LedgerAddress::parse("a".repeat(LedgerAddress::MAX_LEN + 1)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<LedgerAddress, _> = serde_json::from_str("\"addr1\"");
        assert!(ok.is_ok());
        let bad: Result<LedgerAddress, _> = serde_json::from_str("\"not an address\"");
        assert!(bad.is_err());
    }
}
