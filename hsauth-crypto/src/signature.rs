//! Digital signature algorithms for TLS handshakes.

use crate::{Error, HashAlgorithm, Result};
use zeroize::Zeroize;

/// Public-key algorithm of a certificate or private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicKeyAlgorithm {
    /// RSA (PKCS#1 v1.5 or PSS)
    Rsa,
    /// DSA
    Dsa,
    /// ECDSA
    Ecdsa,
    /// Ed25519
    Ed25519,
}

impl PublicKeyAlgorithm {
    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            PublicKeyAlgorithm::Rsa => "RSA",
            PublicKeyAlgorithm::Dsa => "DSA",
            PublicKeyAlgorithm::Ecdsa => "ECDSA",
            PublicKeyAlgorithm::Ed25519 => "EdDSA (Ed25519)",
        }
    }

    /// Whether the algorithm can sign a bare digest.
    ///
    /// EdDSA signs messages, not digests, so it has no SSL 3.0 - TLS 1.1 form.
    pub const fn signs_digests(self) -> bool {
        !matches!(self, PublicKeyAlgorithm::Ed25519)
    }
}

/// TLS SignatureScheme values (RFC 5246 pairs and RFC 8446 schemes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with MD5 (TLS 1.2 only)
    RsaPkcs1Md5,
    /// RSA PKCS#1 v1.5 with SHA-1
    RsaPkcs1Sha1,
    /// DSA with SHA-1
    DsaSha1,
    /// ECDSA with SHA-1
    EcdsaSha1,
    /// RSA PKCS#1 v1.5 with SHA-256
    RsaPkcs1Sha256,
    /// DSA with SHA-256
    DsaSha256,
    /// ECDSA with P-256 and SHA-256
    EcdsaSecp256r1Sha256,
    /// RSA PKCS#1 v1.5 with SHA-384
    RsaPkcs1Sha384,
    /// ECDSA with P-384 and SHA-384
    EcdsaSecp384r1Sha384,
    /// RSA PKCS#1 v1.5 with SHA-512
    RsaPkcs1Sha512,
    /// ECDSA with P-521 and SHA-512
    EcdsaSecp521r1Sha512,
    /// RSA-PSS (rsaEncryption key) with SHA-256
    RsaPssRsaeSha256,
    /// RSA-PSS (rsaEncryption key) with SHA-384
    RsaPssRsaeSha384,
    /// RSA-PSS (rsaEncryption key) with SHA-512
    RsaPssRsaeSha512,
    /// Ed25519
    Ed25519,
}

impl SignatureAlgorithm {
    /// Get the IANA TLS SignatureScheme codepoint.
    pub const fn iana_codepoint(self) -> u16 {
        match self {
            SignatureAlgorithm::RsaPkcs1Md5 => 0x0101,
            SignatureAlgorithm::RsaPkcs1Sha1 => 0x0201,
            SignatureAlgorithm::DsaSha1 => 0x0202,
            SignatureAlgorithm::EcdsaSha1 => 0x0203,
            SignatureAlgorithm::RsaPkcs1Sha256 => 0x0401,
            SignatureAlgorithm::DsaSha256 => 0x0402,
            SignatureAlgorithm::EcdsaSecp256r1Sha256 => 0x0403,
            SignatureAlgorithm::RsaPkcs1Sha384 => 0x0501,
            SignatureAlgorithm::EcdsaSecp384r1Sha384 => 0x0503,
            SignatureAlgorithm::RsaPkcs1Sha512 => 0x0601,
            SignatureAlgorithm::EcdsaSecp521r1Sha512 => 0x0603,
            SignatureAlgorithm::RsaPssRsaeSha256 => 0x0804,
            SignatureAlgorithm::RsaPssRsaeSha384 => 0x0805,
            SignatureAlgorithm::RsaPssRsaeSha512 => 0x0806,
            SignatureAlgorithm::Ed25519 => 0x0807,
        }
    }

    /// Parse an IANA SignatureScheme codepoint.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0101 => Some(SignatureAlgorithm::RsaPkcs1Md5),
            0x0201 => Some(SignatureAlgorithm::RsaPkcs1Sha1),
            0x0202 => Some(SignatureAlgorithm::DsaSha1),
            0x0203 => Some(SignatureAlgorithm::EcdsaSha1),
            0x0401 => Some(SignatureAlgorithm::RsaPkcs1Sha256),
            0x0402 => Some(SignatureAlgorithm::DsaSha256),
            0x0403 => Some(SignatureAlgorithm::EcdsaSecp256r1Sha256),
            0x0501 => Some(SignatureAlgorithm::RsaPkcs1Sha384),
            0x0503 => Some(SignatureAlgorithm::EcdsaSecp384r1Sha384),
            0x0601 => Some(SignatureAlgorithm::RsaPkcs1Sha512),
            0x0603 => Some(SignatureAlgorithm::EcdsaSecp521r1Sha512),
            0x0804 => Some(SignatureAlgorithm::RsaPssRsaeSha256),
            0x0805 => Some(SignatureAlgorithm::RsaPssRsaeSha384),
            0x0806 => Some(SignatureAlgorithm::RsaPssRsaeSha512),
            0x0807 => Some(SignatureAlgorithm::Ed25519),
            _ => None,
        }
    }

    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaPkcs1Md5 => "RSA-MD5",
            SignatureAlgorithm::RsaPkcs1Sha1 => "RSA-SHA1",
            SignatureAlgorithm::DsaSha1 => "DSA-SHA1",
            SignatureAlgorithm::EcdsaSha1 => "ECDSA-SHA1",
            SignatureAlgorithm::RsaPkcs1Sha256 => "RSA-SHA256",
            SignatureAlgorithm::DsaSha256 => "DSA-SHA256",
            SignatureAlgorithm::EcdsaSecp256r1Sha256 => "ECDSA-SECP256R1-SHA256",
            SignatureAlgorithm::RsaPkcs1Sha384 => "RSA-SHA384",
            SignatureAlgorithm::EcdsaSecp384r1Sha384 => "ECDSA-SECP384R1-SHA384",
            SignatureAlgorithm::RsaPkcs1Sha512 => "RSA-SHA512",
            SignatureAlgorithm::EcdsaSecp521r1Sha512 => "ECDSA-SECP521R1-SHA512",
            SignatureAlgorithm::RsaPssRsaeSha256 => "RSA-PSS-RSAE-SHA256",
            SignatureAlgorithm::RsaPssRsaeSha384 => "RSA-PSS-RSAE-SHA384",
            SignatureAlgorithm::RsaPssRsaeSha512 => "RSA-PSS-RSAE-SHA512",
            SignatureAlgorithm::Ed25519 => "ED25519",
        }
    }

    /// Hash applied to the message before signing.
    ///
    /// `None` for EdDSA, which signs the message itself.
    pub const fn hash_algorithm(self) -> Option<HashAlgorithm> {
        match self {
            SignatureAlgorithm::RsaPkcs1Md5 => Some(HashAlgorithm::Md5),
            SignatureAlgorithm::RsaPkcs1Sha1
            | SignatureAlgorithm::DsaSha1
            | SignatureAlgorithm::EcdsaSha1 => Some(HashAlgorithm::Sha1),
            SignatureAlgorithm::RsaPkcs1Sha256
            | SignatureAlgorithm::DsaSha256
            | SignatureAlgorithm::EcdsaSecp256r1Sha256
            | SignatureAlgorithm::RsaPssRsaeSha256 => Some(HashAlgorithm::Sha256),
            SignatureAlgorithm::RsaPkcs1Sha384
            | SignatureAlgorithm::EcdsaSecp384r1Sha384
            | SignatureAlgorithm::RsaPssRsaeSha384 => Some(HashAlgorithm::Sha384),
            SignatureAlgorithm::RsaPkcs1Sha512
            | SignatureAlgorithm::EcdsaSecp521r1Sha512
            | SignatureAlgorithm::RsaPssRsaeSha512 => Some(HashAlgorithm::Sha512),
            SignatureAlgorithm::Ed25519 => None,
        }
    }

    /// Public-key algorithm the scheme signs with.
    pub const fn public_key_algorithm(self) -> PublicKeyAlgorithm {
        match self {
            SignatureAlgorithm::RsaPkcs1Md5
            | SignatureAlgorithm::RsaPkcs1Sha1
            | SignatureAlgorithm::RsaPkcs1Sha256
            | SignatureAlgorithm::RsaPkcs1Sha384
            | SignatureAlgorithm::RsaPkcs1Sha512
            | SignatureAlgorithm::RsaPssRsaeSha256
            | SignatureAlgorithm::RsaPssRsaeSha384
            | SignatureAlgorithm::RsaPssRsaeSha512 => PublicKeyAlgorithm::Rsa,
            SignatureAlgorithm::DsaSha1 | SignatureAlgorithm::DsaSha256 => PublicKeyAlgorithm::Dsa,
            SignatureAlgorithm::EcdsaSha1
            | SignatureAlgorithm::EcdsaSecp256r1Sha256
            | SignatureAlgorithm::EcdsaSecp384r1Sha384
            | SignatureAlgorithm::EcdsaSecp521r1Sha512 => PublicKeyAlgorithm::Ecdsa,
            SignatureAlgorithm::Ed25519 => PublicKeyAlgorithm::Ed25519,
        }
    }

    /// Whether the scheme may appear in a TLS 1.2 handshake.
    pub const fn allowed_in_tls12(self) -> bool {
        true
    }

    /// Whether the scheme may sign a TLS 1.3 CertificateVerify.
    pub const fn allowed_in_tls13(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::EcdsaSecp256r1Sha256
                | SignatureAlgorithm::EcdsaSecp384r1Sha384
                | SignatureAlgorithm::EcdsaSecp521r1Sha512
                | SignatureAlgorithm::RsaPssRsaeSha256
                | SignatureAlgorithm::RsaPssRsaeSha384
                | SignatureAlgorithm::RsaPssRsaeSha512
                | SignatureAlgorithm::Ed25519
        )
    }
}

/// Signing key (private key).
///
/// Zeroized when dropped.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl SigningKey {
    /// Create a new signing key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the signing key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Verification key (public key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    bytes: Vec<u8>,
}

impl VerifyingKey {
    /// Create a new verifying key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the verifying key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Message signature trait for one [`SignatureAlgorithm`].
///
/// The implementation hashes `message` itself where the scheme requires it.
pub trait Signature: Send + Sync {
    /// Sign a message.
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature.
    ///
    /// # Errors
    ///
    /// [`Error::SignatureVerificationFailed`] if the signature does not match,
    /// [`Error::InvalidKey`] or [`Error::InvalidSignature`] for malformed input.
    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;

    /// Get the signature algorithm.
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Generate a new key pair.
    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        Err(Error::UnsupportedAlgorithm(format!(
            "key generation for {}",
            self.algorithm().name()
        )))
    }
}

/// Digest signature trait for one [`PublicKeyAlgorithm`].
///
/// The input is already hashed; no DigestInfo or algorithm identifier is
/// added (RSA uses PKCS#1 v1.5 type 1 padding over the bare digest).
pub trait RawSignature: Send + Sync {
    /// Sign a precomputed digest.
    fn sign_digest(&self, signing_key: &[u8], digest: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature over a precomputed digest.
    fn verify_digest(&self, verifying_key: &[u8], digest: &[u8], signature: &[u8]) -> Result<()>;

    /// Get the public-key algorithm.
    fn algorithm(&self) -> PublicKeyAlgorithm;
}
