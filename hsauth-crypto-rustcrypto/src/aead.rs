//! AES-GCM using the `aes-gcm` crate.

use aes_gcm::aead::{Aead as _, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use hsauth_crypto::{Aead, AeadAlgorithm, Error, Result};

/// Create an AEAD instance for the specified algorithm.
pub fn create_aead(algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
    Ok(Box::new(AesGcm { algorithm }))
}

#[derive(Debug, Clone, Copy)]
struct AesGcm {
    algorithm: AeadAlgorithm,
}

impl AesGcm {
    fn check_nonce(&self, nonce: &[u8]) -> Result<()> {
        if nonce.len() != self.algorithm.nonce_size() {
            return Err(Error::InvalidNonce(format!(
                "{} needs a {}-byte nonce, got {}",
                self.algorithm.name(),
                self.algorithm.nonce_size(),
                nonce.len()
            )));
        }
        Ok(())
    }

    fn bad_key(&self) -> Error {
        Error::InvalidKey(format!(
            "{} needs a {}-byte key",
            self.algorithm.name(),
            self.algorithm.key_size()
        ))
    }
}

impl Aead for AesGcm {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_nonce(nonce)?;
        let payload = Payload {
            msg: plaintext,
            aad,
        };
        let sealed = match self.algorithm {
            AeadAlgorithm::Aes128Gcm => Aes128Gcm::new_from_slice(key)
                .map_err(|_| self.bad_key())?
                .encrypt(Nonce::from_slice(nonce), payload),
            AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| self.bad_key())?
                .encrypt(Nonce::from_slice(nonce), payload),
        };
        sealed.map_err(|_| Error::Internal("AES-GCM encryption failed".to_string()))
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_nonce(nonce)?;
        let payload = Payload {
            msg: ciphertext,
            aad,
        };
        let opened = match self.algorithm {
            AeadAlgorithm::Aes128Gcm => Aes128Gcm::new_from_slice(key)
                .map_err(|_| self.bad_key())?
                .decrypt(Nonce::from_slice(nonce), payload),
            AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| self.bad_key())?
                .decrypt(Nonce::from_slice(nonce), payload),
        };
        opened.map_err(|_| Error::AeadAuthenticationFailed)
    }

    fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }
}
