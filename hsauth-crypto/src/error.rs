//! Error types for cryptographic operations.

/// Result type for cryptographic operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Algorithm not supported by this provider.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Invalid key size or format.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid nonce size.
    #[error("invalid nonce: {0}")]
    InvalidNonce(String),

    /// Authentication tag verification failed (AEAD).
    #[error("AEAD authentication failed")]
    AeadAuthenticationFailed,

    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Signature bytes are malformed for the algorithm.
    #[error("invalid signature encoding")]
    InvalidSignature,

    /// Digest length does not fit the raw signing operation.
    #[error("invalid digest length {0}")]
    InvalidDigestLength(usize),

    /// Output length requested from a KDF is not representable.
    #[error("invalid output length {0}")]
    InvalidLength(usize),

    /// Random number generation failed.
    #[error("random number generation failed")]
    RandomGenerationFailed,

    /// Internal backend error.
    #[error("internal error: {0}")]
    Internal(String),
}
