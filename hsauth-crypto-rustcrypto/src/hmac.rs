//! HMAC implementations using the `hmac` crate.

use hmac::digest::KeyInit;
use hmac::{Hmac as HmacCore, Mac};
use hsauth_crypto::{Error, HashAlgorithm, Hmac, Result};

/// Create an HMAC instance for the specified hash algorithm.
pub fn create_hmac(algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    let state = match algorithm {
        HashAlgorithm::Md5 => HmacState::Md5(keyed(key)?),
        HashAlgorithm::Sha1 => HmacState::Sha1(keyed(key)?),
        HashAlgorithm::Sha224 => HmacState::Sha224(keyed(key)?),
        HashAlgorithm::Sha256 => HmacState::Sha256(keyed(key)?),
        HashAlgorithm::Sha384 => HmacState::Sha384(keyed(key)?),
        HashAlgorithm::Sha512 => HmacState::Sha512(keyed(key)?),
        HashAlgorithm::Md5Sha1 => {
            return Err(Error::UnsupportedAlgorithm(
                "HMAC over MD5+SHA1".to_string(),
            ))
        }
    };
    Ok(Box::new(RustCryptoHmac { algorithm, state }))
}

fn keyed<M: Mac + KeyInit>(key: &[u8]) -> Result<M> {
    <M as KeyInit>::new_from_slice(key).map_err(|_| Error::InvalidKey("HMAC key".to_string()))
}

enum HmacState {
    Md5(HmacCore<md5::Md5>),
    Sha1(HmacCore<sha1::Sha1>),
    Sha224(HmacCore<sha2::Sha224>),
    Sha256(HmacCore<sha2::Sha256>),
    Sha384(HmacCore<sha2::Sha384>),
    Sha512(HmacCore<sha2::Sha512>),
}

/// HMAC (RFC 2104) with incremental updates.
struct RustCryptoHmac {
    algorithm: HashAlgorithm,
    state: HmacState,
}

impl Hmac for RustCryptoHmac {
    fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HmacState::Md5(m) => m.update(data),
            HmacState::Sha1(m) => m.update(data),
            HmacState::Sha224(m) => m.update(data),
            HmacState::Sha256(m) => m.update(data),
            HmacState::Sha384(m) => m.update(data),
            HmacState::Sha512(m) => m.update(data),
        }
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        match self.state {
            HmacState::Md5(m) => m.finalize().into_bytes().to_vec(),
            HmacState::Sha1(m) => m.finalize().into_bytes().to_vec(),
            HmacState::Sha224(m) => m.finalize().into_bytes().to_vec(),
            HmacState::Sha256(m) => m.finalize().into_bytes().to_vec(),
            HmacState::Sha384(m) => m.finalize().into_bytes().to_vec(),
            HmacState::Sha512(m) => m.finalize().into_bytes().to_vec(),
        }
    }

    fn output_size(&self) -> usize {
        self.algorithm.output_size()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_rfc4231_case_2() {
        let mut mac = create_hmac(HashAlgorithm::Sha256, b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        assert_eq!(
            mac.finalize(),
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        let mut mac = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"data");
        let tag = mac.finalize();

        let mut mac = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"data");
        assert!(!mac.verify(&tag[..31]));

        let mut mac = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"data");
        assert!(mac.verify(&tag));
    }
}
