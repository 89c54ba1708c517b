//! Signature implementations using `ed25519-dalek` and `p256`.
//!
//! ECDSA keys are P-256: signing keys are the 32-byte scalar, verifying keys
//! are SEC1 points, signatures are DER encoded as TLS carries them.

use hsauth_crypto::{
    Error, HashAlgorithm, PublicKeyAlgorithm, RawSignature, Result, Signature,
    SignatureAlgorithm, SigningKey, VerifyingKey,
};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::signature::{Signer, Verifier};
use rand::rngs::OsRng;

use crate::hash::create_hash;

/// Create a signature instance for the specified scheme.
pub fn create_signature(algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>> {
    match algorithm {
        SignatureAlgorithm::Ed25519 => Ok(Box::new(Ed25519Signer)),
        SignatureAlgorithm::EcdsaSecp256r1Sha256 => Ok(Box::new(EcdsaP256Signer {
            algorithm,
            hash: None,
        })),
        SignatureAlgorithm::EcdsaSha1 => Ok(Box::new(EcdsaP256Signer {
            algorithm,
            hash: Some(HashAlgorithm::Sha1),
        })),
        other => Err(Error::UnsupportedAlgorithm(other.name().to_string())),
    }
}

/// Create a digest signer for the specified public-key algorithm.
pub fn create_raw_signature(algorithm: PublicKeyAlgorithm) -> Result<Box<dyn RawSignature>> {
    match algorithm {
        PublicKeyAlgorithm::Ecdsa => Ok(Box::new(EcdsaP256Raw)),
        other => Err(Error::UnsupportedAlgorithm(format!(
            "raw {} signatures",
            other.name()
        ))),
    }
}

fn ed25519_signing_key(bytes: &[u8]) -> Result<ed25519_dalek::SigningKey> {
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| Error::InvalidKey("Ed25519 signing key must be 32 bytes".to_string()))?;
    Ok(ed25519_dalek::SigningKey::from_bytes(&seed))
}

fn ed25519_verifying_key(bytes: &[u8]) -> Result<ed25519_dalek::VerifyingKey> {
    let point: [u8; 32] = bytes
        .try_into()
        .map_err(|_| Error::InvalidKey("Ed25519 public key must be 32 bytes".to_string()))?;
    ed25519_dalek::VerifyingKey::from_bytes(&point)
        .map_err(|_| Error::InvalidKey("Ed25519 public key is not a valid point".to_string()))
}

fn p256_signing_key(bytes: &[u8]) -> Result<p256::ecdsa::SigningKey> {
    p256::ecdsa::SigningKey::from_slice(bytes)
        .map_err(|_| Error::InvalidKey("P-256 signing key".to_string()))
}

fn p256_verifying_key(bytes: &[u8]) -> Result<p256::ecdsa::VerifyingKey> {
    p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
        .map_err(|_| Error::InvalidKey("P-256 public key".to_string()))
}

fn p256_signature(der: &[u8]) -> Result<p256::ecdsa::Signature> {
    p256::ecdsa::Signature::from_der(der).map_err(|_| Error::InvalidSignature)
}

/// Ed25519 (RFC 8032).
#[derive(Debug, Clone, Copy)]
struct Ed25519Signer;

impl Signature for Ed25519Signer {
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        let key = ed25519_signing_key(signing_key)?;
        Ok(key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let key = ed25519_verifying_key(verifying_key)?;
        let signature =
            ed25519_dalek::Signature::from_slice(signature).map_err(|_| Error::InvalidSignature)?;
        key.verify(message, &signature)
            .map_err(|_| Error::SignatureVerificationFailed)
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Ed25519
    }

    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        Ok((
            SigningKey::from_bytes(key.to_bytes().to_vec()),
            VerifyingKey::from_bytes(key.verifying_key().to_bytes().to_vec()),
        ))
    }
}

/// ECDSA over P-256.
///
/// With `hash` unset the message is hashed with SHA-256 by the `p256`
/// signer; otherwise it is hashed here and signed as a prehash.
#[derive(Debug, Clone, Copy)]
struct EcdsaP256Signer {
    algorithm: SignatureAlgorithm,
    hash: Option<HashAlgorithm>,
}

impl EcdsaP256Signer {
    fn digest(&self, hash: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>> {
        let mut h = create_hash(hash)?;
        h.update(message);
        Ok(h.finalize())
    }
}

impl Signature for EcdsaP256Signer {
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        let key = p256_signing_key(signing_key)?;
        let signature: p256::ecdsa::Signature = match self.hash {
            None => key.sign(message),
            Some(hash) => key
                .sign_prehash(&self.digest(hash, message)?)
                .map_err(|_| Error::Internal("ECDSA prehash signing failed".to_string()))?,
        };
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let key = p256_verifying_key(verifying_key)?;
        let signature = p256_signature(signature)?;
        let verified = match self.hash {
            None => key.verify(message, &signature),
            Some(hash) => key.verify_prehash(&self.digest(hash, message)?, &signature),
        };
        verified.map_err(|_| Error::SignatureVerificationFailed)
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        let key = p256::ecdsa::SigningKey::random(&mut OsRng);
        let public = p256::ecdsa::VerifyingKey::from(&key);
        Ok((
            SigningKey::from_bytes(key.to_bytes().to_vec()),
            VerifyingKey::from_bytes(public.to_encoded_point(false).as_bytes().to_vec()),
        ))
    }
}

/// ECDSA P-256 over a caller-supplied digest.
///
/// Digests longer than the field are truncated to their leftmost bits
/// (FIPS 186-4, 6.4), which is how the 36-byte MD5+SHA-1 input is handled.
#[derive(Debug, Clone, Copy)]
struct EcdsaP256Raw;

impl RawSignature for EcdsaP256Raw {
    fn sign_digest(&self, signing_key: &[u8], digest: &[u8]) -> Result<Vec<u8>> {
        let key = p256_signing_key(signing_key)?;
        let signature: p256::ecdsa::Signature = key
            .sign_prehash(digest)
            .map_err(|_| Error::InvalidDigestLength(digest.len()))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify_digest(&self, verifying_key: &[u8], digest: &[u8], signature: &[u8]) -> Result<()> {
        let key = p256_verifying_key(verifying_key)?;
        let signature = p256_signature(signature)?;
        key.verify_prehash(digest, &signature)
            .map_err(|_| Error::SignatureVerificationFailed)
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        PublicKeyAlgorithm::Ecdsa
    }
}
