//! Hash function implementations using the RustCrypto digests.

use hsauth_crypto::{Hash, HashAlgorithm, Result};
use sha2::Digest;

/// Create a hash instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
    let state = match algorithm {
        HashAlgorithm::Md5 => HashState::Md5(md5::Md5::new()),
        HashAlgorithm::Sha1 => HashState::Sha1(sha1::Sha1::new()),
        HashAlgorithm::Md5Sha1 => HashState::Md5Sha1(md5::Md5::new(), sha1::Sha1::new()),
        HashAlgorithm::Sha224 => HashState::Sha224(sha2::Sha224::new()),
        HashAlgorithm::Sha256 => HashState::Sha256(sha2::Sha256::new()),
        HashAlgorithm::Sha384 => HashState::Sha384(sha2::Sha384::new()),
        HashAlgorithm::Sha512 => HashState::Sha512(sha2::Sha512::new()),
    };
    Ok(Box::new(RustCryptoHash { algorithm, state }))
}

enum HashState {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Md5Sha1(md5::Md5, sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

/// Incremental hash over one of the supported digests.
///
/// The MD5+SHA-1 variant feeds both digests and concatenates their
/// outputs, MD5 first.
struct RustCryptoHash {
    algorithm: HashAlgorithm,
    state: HashState,
}

impl Hash for RustCryptoHash {
    fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HashState::Md5(h) => h.update(data),
            HashState::Sha1(h) => h.update(data),
            HashState::Md5Sha1(md5, sha1) => {
                md5.update(data);
                sha1.update(data);
            }
            HashState::Sha224(h) => h.update(data),
            HashState::Sha256(h) => h.update(data),
            HashState::Sha384(h) => h.update(data),
            HashState::Sha512(h) => h.update(data),
        }
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        match self.state {
            HashState::Md5(h) => h.finalize().to_vec(),
            HashState::Sha1(h) => h.finalize().to_vec(),
            HashState::Md5Sha1(md5, sha1) => {
                let mut out = md5.finalize().to_vec();
                out.extend_from_slice(&sha1.finalize());
                out
            }
            HashState::Sha224(h) => h.finalize().to_vec(),
            HashState::Sha256(h) => h.finalize().to_vec(),
            HashState::Sha384(h) => h.finalize().to_vec(),
            HashState::Sha512(h) => h.finalize().to_vec(),
        }
    }

    fn output_size(&self) -> usize {
        self.algorithm.output_size()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}
