//! # hsauth Cryptographic Provider Interface
//!
//! This crate defines the narrow cryptographic services consumed by the
//! handshake authentication core: hashing, HMAC, HKDF, AEAD sealing of
//! session tickets, randomness, and signatures.
//!
//! ## Architecture
//!
//! ```text
//! CryptoProvider (main trait)
//! ├── Hash (MD5, SHA-1, MD5+SHA-1, SHA-224/256/384/512)
//! ├── Hmac (HMAC over any of the above except MD5+SHA-1)
//! ├── Kdf (HKDF-Extract / HKDF-Expand)
//! ├── Aead (AES-GCM, used for ticket protection)
//! ├── Random (CSPRNG)
//! ├── Signature (TLS 1.2/1.3 SignatureScheme signing over whole messages)
//! └── RawSignature (legacy digest signing for SSL 3.0 - TLS 1.1)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use hsauth_crypto::{CryptoProvider, HashAlgorithm};
//!
//! fn transcript_hash(provider: &dyn CryptoProvider, data: &[u8]) -> hsauth_crypto::Result<Vec<u8>> {
//!     let mut hash = provider.hash(HashAlgorithm::Sha256)?;
//!     hash.update(data);
//!     Ok(hash.finalize())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod aead;
pub mod error;
pub mod hash;
pub mod hmac;
pub mod kdf;
pub mod random;
pub mod signature;

pub use aead::{Aead, AeadAlgorithm};
pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm};
pub use hmac::Hmac;
pub use kdf::{Kdf, KdfAlgorithm};
pub use random::Random;
pub use signature::{
    PublicKeyAlgorithm, RawSignature, Signature, SignatureAlgorithm, SigningKey, VerifyingKey,
};

/// Main cryptographic provider trait.
///
/// A provider hands out fresh primitive instances on request. Instances are
/// single-use where the underlying primitive is stateful (hashes, HMACs).
///
/// # Thread Safety
///
/// Providers must be `Send + Sync`; the core never shares one session
/// between threads but may share one provider between sessions.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Create a new provider instance.
    fn new() -> Self
    where
        Self: Sized;

    /// Get a hash function instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] if the backend lacks the hash.
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>>;

    /// Get an HMAC instance keyed with `key`.
    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>>;

    /// Get a key derivation function instance.
    fn kdf(&self, algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>>;

    /// Get an AEAD cipher instance.
    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>>;

    /// Get the random number generator.
    fn random(&self) -> &dyn Random;

    /// Get a signature scheme instance (hash-then-sign handled internally).
    fn signature(&self, algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>>;

    /// Get a raw signer for an already computed digest.
    ///
    /// Used by SSL 3.0 through TLS 1.1, where the signed input is a
    /// concatenated MD5+SHA-1 or bare SHA-1 digest with no algorithm
    /// identifier.
    fn raw_signature(&self, algorithm: PublicKeyAlgorithm) -> Result<Box<dyn RawSignature>>;

    /// Check if a signature scheme is supported.
    fn supports_signature(&self, algorithm: SignatureAlgorithm) -> bool {
        self.signature(algorithm).is_ok()
    }

    /// Check if a hash algorithm is supported.
    fn supports_hash(&self, algorithm: HashAlgorithm) -> bool {
        self.hash(algorithm).is_ok()
    }
}
