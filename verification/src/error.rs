use attest_crypto::CryptoError;
use attest_store::StoreError;
use attest_types::Provider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("verification {0} not found")]
    NotFound(String),

    #[error("malformed provider payload: {0}")]
    InvalidPayload(String),

    #[error("invalid profile URL: {0}")]
    InvalidUrl(String),

    #[error("provider {0} is not configured")]
    ProviderNotConfigured(Provider),

    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: Provider, reason: String },

    #[error("provider {0} did not answer in time")]
    ProviderTimeout(Provider),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VerificationError {
    /// Provider outages may clear up; malformed input never does.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerificationError::ProviderUnavailable { .. } | VerificationError::ProviderTimeout(_)
        )
    }
}
