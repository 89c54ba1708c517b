//! Key Derivation Function (KDF) interface.

use crate::{HashAlgorithm, Result};

/// HKDF instances available as TLS 1.3 PRFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdfAlgorithm {
    /// HKDF with SHA-256
    HkdfSha256,
    /// HKDF with SHA-384
    HkdfSha384,
    /// HKDF with SHA-512
    HkdfSha512,
}

impl KdfAlgorithm {
    /// Get the underlying hash algorithm.
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            KdfAlgorithm::HkdfSha256 => HashAlgorithm::Sha256,
            KdfAlgorithm::HkdfSha384 => HashAlgorithm::Sha384,
            KdfAlgorithm::HkdfSha512 => HashAlgorithm::Sha512,
        }
    }

    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            KdfAlgorithm::HkdfSha256 => "HKDF-SHA256",
            KdfAlgorithm::HkdfSha384 => "HKDF-SHA384",
            KdfAlgorithm::HkdfSha512 => "HKDF-SHA512",
        }
    }
}

/// HKDF (RFC 5869).
pub trait Kdf: Send + Sync {
    /// HKDF-Extract. An empty salt means a string of `HashLen` zeros.
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> Vec<u8>;

    /// HKDF-Expand.
    ///
    /// # Errors
    ///
    /// Fails if `prk` is shorter than the hash output or `length` exceeds
    /// `255 * HashLen`.
    fn expand(&self, prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>>;

    /// Extract followed by expand.
    fn derive(&self, salt: &[u8], ikm: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>> {
        let prk = self.extract(salt, ikm);
        self.expand(&prk, info, length)
    }

    /// Get the KDF algorithm.
    fn algorithm(&self) -> KdfAlgorithm;

    /// Get the output size of the underlying hash.
    fn hash_output_size(&self) -> usize {
        self.algorithm().hash_algorithm().output_size()
    }
}
