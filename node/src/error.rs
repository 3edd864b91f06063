use std::fmt;

use attest_badge::BadgeError;
use attest_crypto::CryptoError;
use attest_ledger::{LedgerError, RejectReason};
use attest_store::StoreError;
use attest_types::TypesError;
use attest_verification::VerificationError;
use thiserror::Error;

/// Startup and configuration failures.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// What went wrong, as far as a caller is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input or a business-rule violation.
    Validation,
    NotFound,
    /// Uniqueness violation; retrying the same request cannot succeed.
    Conflict,
    RateLimited,
    /// Identity provider or ledger unreachable or erroring.
    ExternalService,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ExternalService => "external_service",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure of a pipeline operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Machine-readable refinement of the kind, e.g. `already_voted`.
    pub reason: Option<&'static str>,
    /// Seconds until a rate-limited caller may retry.
    pub retry_after_secs: Option<u64>,
}

impl PipelineError {
    fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            reason: None,
            retry_after_secs: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message, false)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message, false)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message, false)
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after_secs: Some(retry_after_secs),
            ..Self::new(ErrorKind::RateLimited, "too many requests", true)
        }
    }

    pub fn external(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(ErrorKind::ExternalService, message, retryable)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message, false)
    }

    pub fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn already_voted() -> Self {
        Self::conflict("a vote was already cast with this credential on this proposal")
            .with_reason("already_voted")
    }
}

impl From<LedgerError> for PipelineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Unreachable(_) | LedgerError::Timeout { .. } => {
                PipelineError::external(e.to_string(), true)
            }
            LedgerError::Rejected(RejectReason::AlreadyVoted) => PipelineError::already_voted(),
            LedgerError::Rejected(RejectReason::InsufficientFee) => {
                PipelineError::external(e.to_string(), false).with_reason("insufficient_fee")
            }
            LedgerError::Rejected(RejectReason::Other(_)) => {
                PipelineError::external(e.to_string(), false).with_reason("ledger_rejected")
            }
            LedgerError::InvalidResponse(_) => PipelineError::external(e.to_string(), false),
        }
    }
}

impl From<VerificationError> for PipelineError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::NotFound(_) => PipelineError::not_found(e.to_string()),
            VerificationError::InvalidPayload(_)
            | VerificationError::InvalidUrl(_)
            | VerificationError::ProviderNotConfigured(_) => {
                PipelineError::validation(e.to_string())
            }
            VerificationError::ProviderUnavailable { .. } | VerificationError::ProviderTimeout(_) => {
                PipelineError::external(e.to_string(), true)
            }
            VerificationError::Crypto(inner) => inner.into(),
            VerificationError::Store(inner) => inner.into(),
        }
    }
}

impl From<BadgeError> for PipelineError {
    fn from(e: BadgeError) -> Self {
        match e {
            BadgeError::NotFound(_) => PipelineError::not_found(e.to_string()),
            BadgeError::AddressMismatch { .. }
            | BadgeError::NotVerified(_)
            | BadgeError::VerificationExpired
            | BadgeError::Revoked(_)
            | BadgeError::NotRenewable(_) => PipelineError::validation(e.to_string()),
            BadgeError::AlreadyIssued { .. } | BadgeError::VerificationConsumed(_) => {
                PipelineError::conflict(e.to_string())
            }
            BadgeError::Ledger(inner) => inner.into(),
            BadgeError::Crypto(inner) => inner.into(),
            BadgeError::Store(inner) => inner.into(),
        }
    }
}

impl From<TypesError> for PipelineError {
    fn from(e: TypesError) -> Self {
        PipelineError::validation(e.to_string())
    }
}

impl From<CryptoError> for PipelineError {
    fn from(e: CryptoError) -> Self {
        PipelineError::internal(e.to_string())
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        PipelineError::internal(e.to_string())
    }
}
