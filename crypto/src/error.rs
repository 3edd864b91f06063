use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS randomness source failed. Callers must not fall back to weaker randomness.
    #[error("secure randomness unavailable: {0}")]
    EntropyUnavailable(String),

    #[error(transparent)]
    Types(#[from] attest_types::TypesError),
}
