//! Pre-TLS 1.3 master secret derivation.
//!
//! ```text
//! SSL 3.0:      master = MD5(pms + SHA1("A" + pms + cr + sr)) +
//!                        MD5(pms + SHA1("BB" + pms + cr + sr)) +
//!                        MD5(pms + SHA1("CCC" + pms + cr + sr))
//! TLS 1.0/1.1:  PRF = P_MD5(S1, label + seed) XOR P_SHA1(S2, label + seed)
//! TLS 1.2:      PRF = P_<hash>(secret, label + seed)
//!
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) +
//!                        HMAC_hash(secret, A(2) + seed) + ...
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))
//! ```

use hsauth_crypto::{CryptoProvider, HashAlgorithm};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::protocol::ProtocolVersion;
use crate::session::SecurityState;

/// Length of every pre-TLS 1.3 master secret.
pub const MASTER_SECRET_LEN: usize = 48;

const MASTER_SECRET_LABEL: &[u8] = b"master secret";
const SSL3_PAD1: u8 = 0x36;
const SSL3_PAD2: u8 = 0x5c;

/// P_hash expansion with one HMAC hash.
pub struct PHash<'a> {
    provider: &'a dyn CryptoProvider,
    hash: HashAlgorithm,
}

impl<'a> PHash<'a> {
    /// P_hash over `hash`'s HMAC.
    pub fn new(provider: &'a dyn CryptoProvider, hash: HashAlgorithm) -> Self {
        Self { provider, hash }
    }

    /// `output_len` bytes of P_hash(secret, label + seed).
    pub fn compute(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut label_seed = Vec::with_capacity(label.len() + seed.len());
        label_seed.extend_from_slice(label);
        label_seed.extend_from_slice(seed);

        let mut output = Zeroizing::new(Vec::with_capacity(output_len));
        let mut a = Zeroizing::new(label_seed.clone());
        while output.len() < output_len {
            a = Zeroizing::new(self.hmac(secret, &[&a[..]])?);
            let block = Zeroizing::new(self.hmac(secret, &[&a[..], &label_seed[..]])?);
            let take = block.len().min(output_len - output.len());
            output.extend_from_slice(&block[..take]);
        }
        Ok(output)
    }

    fn hmac(&self, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>> {
        let mut mac = self.provider.hmac(self.hash, key)?;
        for part in parts {
            mac.update(part);
        }
        Ok(mac.finalize())
    }
}

/// TLS 1.0/1.1 PRF: the secret is split into two (possibly overlapping)
/// halves keying P_MD5 and P_SHA1.
pub fn tls10_prf(
    provider: &dyn CryptoProvider,
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let half = (secret.len() + 1) / 2;
    let s1 = &secret[..half];
    let s2 = &secret[secret.len() - half..];

    let mut output = PHash::new(provider, HashAlgorithm::Md5).compute(s1, label, seed, output_len)?;
    let sha1 = PHash::new(provider, HashAlgorithm::Sha1).compute(s2, label, seed, output_len)?;
    for (out, b) in output.iter_mut().zip(sha1.iter()) {
        *out ^= b;
    }
    Ok(output)
}

/// TLS 1.2 PRF with the cipher suite hash.
pub fn tls12_prf(
    provider: &dyn CryptoProvider,
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if !matches!(
        hash,
        HashAlgorithm::Sha256 | HashAlgorithm::Sha384 | HashAlgorithm::Sha512
    ) {
        return Err(Error::Protocol(format!("{} cannot serve as a PRF", hash.name())));
    }
    PHash::new(provider, hash).compute(secret, label, seed, output_len)
}

/// SSL 3.0 master secret.
pub fn ssl3_master_secret(
    provider: &dyn CryptoProvider,
    premaster_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut master = Zeroizing::new(Vec::with_capacity(MASTER_SECRET_LEN));
    for label in [&b"A"[..], &b"BB"[..], &b"CCC"[..]] {
        let mut sha1 = provider.hash(HashAlgorithm::Sha1)?;
        sha1.update(label);
        sha1.update(premaster_secret);
        sha1.update(client_random);
        sha1.update(server_random);
        let inner = Zeroizing::new(sha1.finalize());

        let mut md5 = provider.hash(HashAlgorithm::Md5)?;
        md5.update(premaster_secret);
        md5.update(&inner);
        master.extend_from_slice(&Zeroizing::new(md5.finalize()));
    }
    Ok(master)
}

/// Derive the session's master secret from its premaster secret and randoms.
///
/// Every call replaces `session.master_secret` and bumps
/// [`SecurityState::master_secret_generation`].
pub fn generate_master_secret(session: &mut SecurityState, provider: &dyn CryptoProvider) -> Result<()> {
    if session.premaster_secret.is_empty() {
        return Err(Error::Internal("premaster secret not set".to_string()));
    }

    let mut seed = [0u8; 64];
    seed[..32].copy_from_slice(&session.client_random);
    seed[32..].copy_from_slice(&session.server_random);

    let pms = &session.premaster_secret;
    let master = match session.version {
        ProtocolVersion::Ssl30 => {
            ssl3_master_secret(provider, pms, &session.client_random, &session.server_random)?
        }
        ProtocolVersion::Tls10 | ProtocolVersion::Tls11 | ProtocolVersion::Dtls10 => {
            tls10_prf(provider, pms, MASTER_SECRET_LABEL, &seed, MASTER_SECRET_LEN)?
        }
        ProtocolVersion::Tls12 | ProtocolVersion::Dtls12 => {
            tls12_prf(provider, session.prf, pms, MASTER_SECRET_LABEL, &seed, MASTER_SECRET_LEN)?
        }
        v => {
            return Err(Error::Internal(format!(
                "{} has no legacy master secret",
                v.name()
            )))
        }
    };

    session.master_secret = master;
    session.bump_master_secret_generation();
    debug!(
        version = session.version.name(),
        generation = session.master_secret_generation(),
        "generated master secret"
    );
    Ok(())
}

/// SSL 3.0 handshake MAC used by CertificateVerify:
///
/// ```text
/// hash(master + pad2 + hash(handshake_messages + master + pad1))
/// ```
///
/// with pads of 48 bytes for MD5 and 40 for SHA-1.
pub fn ssl3_handshake_mac(
    provider: &dyn CryptoProvider,
    hash: HashAlgorithm,
    handshake_messages: &[u8],
    master_secret: &[u8],
) -> Result<Vec<u8>> {
    let pad_len = match hash {
        HashAlgorithm::Md5 => 48,
        HashAlgorithm::Sha1 => 40,
        other => {
            return Err(Error::Internal(format!(
                "{} has no SSL 3.0 MAC",
                other.name()
            )))
        }
    };

    let mut inner = provider.hash(hash)?;
    inner.update(handshake_messages);
    inner.update(master_secret);
    inner.update(&[SSL3_PAD1; 48][..pad_len]);
    let inner = inner.finalize();

    let mut outer = provider.hash(hash)?;
    outer.update(master_secret);
    outer.update(&[SSL3_PAD2; 48][..pad_len]);
    outer.update(&inner);
    Ok(outer.finalize())
}
