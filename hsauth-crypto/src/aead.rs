//! AEAD cipher interface.
//!
//! Only used to seal session tickets, so the set of algorithms is small.

use crate::Result;

/// AEAD algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// AES-128-GCM
    Aes128Gcm,
    /// AES-256-GCM
    Aes256Gcm,
}

impl AeadAlgorithm {
    /// Key size in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128Gcm => 16,
            AeadAlgorithm::Aes256Gcm => 32,
        }
    }

    /// Nonce size in bytes.
    pub const fn nonce_size(self) -> usize {
        12
    }

    /// Authentication tag size in bytes.
    pub const fn tag_size(self) -> usize {
        16
    }

    /// Algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            AeadAlgorithm::Aes128Gcm => "AES_128_GCM",
            AeadAlgorithm::Aes256Gcm => "AES_256_GCM",
        }
    }
}

/// AEAD cipher trait.
pub trait Aead: Send + Sync {
    /// Encrypt and authenticate. Returns ciphertext with the tag appended.
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Verify and decrypt.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AeadAuthenticationFailed`] when the tag does not verify.
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Get the algorithm.
    fn algorithm(&self) -> AeadAlgorithm;
}
