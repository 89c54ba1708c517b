//! HKDF implementations using the `hkdf` crate.

use hkdf::Hkdf;
use hsauth_crypto::{Error, Kdf, KdfAlgorithm, Result};

/// Create a KDF instance for the specified algorithm.
pub fn create_kdf(algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
    Ok(Box::new(RustCryptoHkdf { algorithm }))
}

macro_rules! extract_with {
    ($hash:ty, $salt:expr, $ikm:expr) => {{
        let salt = if $salt.is_empty() { None } else { Some($salt) };
        let (prk, _) = Hkdf::<$hash>::extract(salt, $ikm);
        prk.to_vec()
    }};
}

macro_rules! expand_with {
    ($hash:ty, $prk:expr, $info:expr, $length:expr) => {{
        let hkdf = Hkdf::<$hash>::from_prk($prk)
            .map_err(|_| Error::InvalidKey("HKDF PRK shorter than hash output".to_string()))?;
        let mut okm = vec![0u8; $length];
        hkdf.expand($info, &mut okm)
            .map_err(|_| Error::InvalidLength($length))?;
        Ok(okm)
    }};
}

/// HKDF (RFC 5869) over SHA-256, SHA-384 or SHA-512.
#[derive(Debug, Clone, Copy)]
struct RustCryptoHkdf {
    algorithm: KdfAlgorithm,
}

impl Kdf for RustCryptoHkdf {
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
        match self.algorithm {
            KdfAlgorithm::HkdfSha256 => extract_with!(sha2::Sha256, salt, ikm),
            KdfAlgorithm::HkdfSha384 => extract_with!(sha2::Sha384, salt, ikm),
            KdfAlgorithm::HkdfSha512 => extract_with!(sha2::Sha512, salt, ikm),
        }
    }

    fn expand(&self, prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>> {
        match self.algorithm {
            KdfAlgorithm::HkdfSha256 => expand_with!(sha2::Sha256, prk, info, length),
            KdfAlgorithm::HkdfSha384 => expand_with!(sha2::Sha384, prk, info, length),
            KdfAlgorithm::HkdfSha512 => expand_with!(sha2::Sha512, prk, info, length),
        }
    }

    fn algorithm(&self) -> KdfAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_rfc5869_case_1() {
        let kdf = create_kdf(KdfAlgorithm::HkdfSha256).unwrap();
        let ikm = [0x0b; 22];
        let salt = hex!("000102030405060708090a0b0c");
        let info = hex!("f0f1f2f3f4f5f6f7f8f9");

        let prk = kdf.extract(&salt, &ikm);
        assert_eq!(
            prk,
            hex!("077709362c2e32df0ddc3f0dc47bba6390b6c73bb50f9c3122ec844ad7c2b3e5")
        );

        let okm = kdf.expand(&prk, &info, 42).unwrap();
        assert_eq!(
            okm,
            hex!(
                "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf"
                "34007208d5b887185865"
            )
        );
    }

    #[test]
    fn test_empty_salt_is_zero_salt() {
        let kdf = create_kdf(KdfAlgorithm::HkdfSha384).unwrap();
        assert_eq!(kdf.extract(&[], b"psk"), kdf.extract(&[0u8; 48], b"psk"));
    }

    #[test]
    fn test_expand_rejects_oversized_output() {
        let kdf = create_kdf(KdfAlgorithm::HkdfSha256).unwrap();
        let prk = kdf.extract(&[], b"ikm");
        assert_eq!(
            kdf.expand(&prk, b"", 255 * 32 + 1),
            Err(Error::InvalidLength(255 * 32 + 1))
        );
    }
}
