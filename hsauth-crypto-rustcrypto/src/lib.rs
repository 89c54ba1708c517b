//! # RustCrypto-based Cryptography Provider for hsauth
//!
//! This crate implements [`hsauth_crypto::CryptoProvider`] on top of the
//! RustCrypto project crates.
//!
//! ## Supported Algorithms
//!
//! - **Hash**: MD5, SHA-1, MD5+SHA-1, SHA-224, SHA-256, SHA-384, SHA-512
//! - **HMAC**: with any single hash above
//! - **KDF**: HKDF-SHA256, HKDF-SHA384, HKDF-SHA512
//! - **AEAD**: AES-128-GCM, AES-256-GCM
//! - **Signatures**: Ed25519, ECDSA P-256 (SHA-256 and SHA-1), raw ECDSA P-256
//!   over a digest
//! - **RNG**: operating system entropy
//!
//! RSA and DSA are not provided; callers needing them plug their own
//! [`hsauth_crypto::RawSignature`] or [`hsauth_crypto::Signature`] in front
//! of this provider.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hsauth_crypto::{CryptoProvider, HashAlgorithm};
//! use hsauth_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider = RustCryptoProvider::new();
//! let mut hash = provider.hash(HashAlgorithm::Sha256).unwrap();
//! hash.update(b"abc");
//! let digest = hash.finalize();
//! assert_eq!(digest.len(), 32);
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use hsauth_crypto::{
    Aead, AeadAlgorithm, CryptoProvider, Hash, HashAlgorithm, Hmac, Kdf, KdfAlgorithm,
    PublicKeyAlgorithm, Random, RawSignature, Result, Signature, SignatureAlgorithm,
};

pub mod aead;
pub mod hash;
pub mod hkdf;
pub mod hmac;
pub mod random;
pub mod signature;

use random::OsRandom;

/// Cryptography provider using RustCrypto implementations.
///
/// # Thread Safety
///
/// This provider is `Send + Sync` and can be shared across threads.
#[derive(Debug, Default)]
pub struct RustCryptoProvider {
    random: OsRandom,
}

impl CryptoProvider for RustCryptoProvider {
    fn new() -> Self {
        Self { random: OsRandom }
    }

    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        hash::create_hash(algorithm)
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn kdf(&self, algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
        hkdf::create_kdf(algorithm)
    }

    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
        aead::create_aead(algorithm)
    }

    fn random(&self) -> &dyn Random {
        &self.random
    }

    fn signature(&self, algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>> {
        signature::create_signature(algorithm)
    }

    fn raw_signature(&self, algorithm: PublicKeyAlgorithm) -> Result<Box<dyn RawSignature>> {
        signature::create_raw_signature(algorithm)
    }
}
