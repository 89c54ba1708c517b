//! Hash function interface.

use crate::kdf::KdfAlgorithm;

/// Hash algorithms used by the handshake.
///
/// `Md5Sha1` is the 36-byte concatenation `MD5(m) || SHA-1(m)` used by
/// SSL 3.0 through TLS 1.1 for RSA signatures. It has no HMAC or HKDF form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (legacy signatures only)
    Md5,
    /// SHA-1
    Sha1,
    /// MD5 and SHA-1 over the same input, concatenated
    Md5Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Get the output size in bytes.
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Md5Sha1 => 36,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Md5Sha1 => "MD5+SHA1",
            HashAlgorithm::Sha224 => "SHA224",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    /// The HKDF instance built on this hash, if it can serve as a TLS 1.3 PRF.
    pub const fn to_kdf_algorithm(self) -> Option<KdfAlgorithm> {
        match self {
            HashAlgorithm::Sha256 => Some(KdfAlgorithm::HkdfSha256),
            HashAlgorithm::Sha384 => Some(KdfAlgorithm::HkdfSha384),
            HashAlgorithm::Sha512 => Some(KdfAlgorithm::HkdfSha512),
            _ => None,
        }
    }

    /// TLS 1.2 HashAlgorithm registry value (RFC 5246, 7.4.1.4.1).
    pub const fn tls12_id(self) -> Option<u8> {
        match self {
            HashAlgorithm::Md5 => Some(1),
            HashAlgorithm::Sha1 => Some(2),
            HashAlgorithm::Sha224 => Some(3),
            HashAlgorithm::Sha256 => Some(4),
            HashAlgorithm::Sha384 => Some(5),
            HashAlgorithm::Sha512 => Some(6),
            HashAlgorithm::Md5Sha1 => None,
        }
    }

    /// Inverse of [`HashAlgorithm::tls12_id`].
    pub const fn from_tls12_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(HashAlgorithm::Md5),
            2 => Some(HashAlgorithm::Sha1),
            3 => Some(HashAlgorithm::Sha224),
            4 => Some(HashAlgorithm::Sha256),
            5 => Some(HashAlgorithm::Sha384),
            6 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// Hash function trait.
///
/// Instances are consumed by `finalize`; request a new one from the
/// provider for each digest.
pub trait Hash: Send {
    /// Update the hash state with data.
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the digest.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Get the output size in bytes.
    fn output_size(&self) -> usize;

    /// Get the hash algorithm.
    fn algorithm(&self) -> HashAlgorithm;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_sizes() {
        assert_eq!(HashAlgorithm::Md5.output_size(), 16);
        assert_eq!(HashAlgorithm::Sha1.output_size(), 20);
        assert_eq!(
            HashAlgorithm::Md5Sha1.output_size(),
            HashAlgorithm::Md5.output_size() + HashAlgorithm::Sha1.output_size()
        );
    }

    #[test]
    fn test_only_sha2_is_a_prf() {
        assert!(HashAlgorithm::Sha1.to_kdf_algorithm().is_none());
        assert!(HashAlgorithm::Md5Sha1.to_kdf_algorithm().is_none());
        assert_eq!(
            HashAlgorithm::Sha384.to_kdf_algorithm(),
            Some(KdfAlgorithm::HkdfSha384)
        );
    }

    #[test]
    fn test_tls12_ids() {
        for alg in [
            HashAlgorithm::Md5,
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha224,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            let id = alg.tls12_id().unwrap();
            assert_eq!(HashAlgorithm::from_tls12_id(id), Some(alg));
        }
        assert_eq!(HashAlgorithm::from_tls12_id(0), None);
    }
}
