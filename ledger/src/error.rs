use std::fmt;

use thiserror::Error;

/// Why the ledger refused a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The vote nullifier is already recorded on-chain.
    AlreadyVoted,
    /// The attached fee does not cover the transition.
    InsufficientFee,
    Other(String),
}

impl RejectReason {
    /// Classify a ledger rejection message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("nullifier") && (lower.contains("exist") || lower.contains("spent")) {
            RejectReason::AlreadyVoted
        } else if lower.contains("fee") {
            RejectReason::InsufficientFee
        } else {
            RejectReason::Other(message.to_string())
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::AlreadyVoted => f.write_str("already voted"),
            RejectReason::InsufficientFee => f.write_str("insufficient fee"),
            RejectReason::Other(msg) => f.write_str(msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger unreachable: {0}")]
    Unreachable(String),

    #[error("ledger call `{operation}` timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u64 },

    #[error("ledger rejected transition: {0}")]
    Rejected(RejectReason),

    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    /// Network and timeout failures may succeed on retry; rejections never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Unreachable(_) | LedgerError::Timeout { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LedgerError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rejections() {
        assert_eq!(
            RejectReason::classify("Nullifier already exists in mapping"),
            RejectReason::AlreadyVoted
        );
        assert_eq!(
            RejectReason::classify("insufficient fee for execution"),
            RejectReason::InsufficientFee
        );
        assert_eq!(
            RejectReason::classify("assertion failed"),
            RejectReason::Other("assertion failed".into())
        );
    }

    #[test]
    fn retryability() {
        assert!(LedgerError::Unreachable("down".into()).is_retryable());
        assert!(LedgerError::Timeout { operation: "submit", millis: 5_000 }.is_retryable());
        assert!(!LedgerError::Rejected(RejectReason::AlreadyVoted).is_retryable());
        assert!(!LedgerError::InvalidResponse("garbage".into()).is_retryable());
    }
}
