//! TLS 1.3 secret derivation for PSKs and binders.
//!
//! All functions are pure over their inputs. Secret outputs are returned in
//! [`Zeroizing`] buffers so they are wiped on every exit path.

use hsauth_crypto::{CryptoProvider, HashAlgorithm, KdfAlgorithm};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::session::PskSource;
use crate::transcript::digest;

/// Label prefix of every HKDF-Expand-Label invocation.
const LABEL_PREFIX: &[u8] = b"tls13 ";

/// Label deriving a resumption PSK from the resumption master secret.
pub const RESUMPTION_LABEL: &[u8] = b"resumption";

/// Binder key label for PSKs configured out of band.
pub const EXT_BINDER_LABEL: &[u8] = b"ext binder";

/// Binder key label for PSKs derived from session tickets.
pub const RES_BINDER_LABEL: &[u8] = b"res binder";

/// Label deriving a Finished key.
pub const FINISHED_LABEL: &[u8] = b"finished";

/// Resolve the HKDF instance for a binder PRF.
///
/// Only hashes with an HKDF form can key a TLS 1.3 schedule; anything else
/// is a negotiation bug upstream.
pub fn prf_kdf(prf: HashAlgorithm) -> Result<KdfAlgorithm> {
    let size = prf.output_size();
    if size == 0 || size > 255 {
        return Err(Error::Protocol(format!(
            "PRF output size {} out of range",
            size
        )));
    }
    prf.to_kdf_algorithm()
        .ok_or_else(|| Error::Protocol(format!("{} cannot serve as a PRF", prf.name())))
}

/// HKDF-Expand-Label (RFC 8446, Section 7.1).
///
/// ```text
/// struct {
///     uint16 length = Length;
///     opaque label<7..255> = "tls13 " + Label;
///     opaque context<0..255> = Context;
/// } HkdfLabel;
/// ```
pub fn hkdf_expand_label(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let kdf = provider.kdf(prf_kdf(prf)?)?;

    let full_label_len = LABEL_PREFIX.len() + label.len();
    if full_label_len > 255 {
        return Err(Error::Internal(format!("label of {} bytes", full_label_len)));
    }
    if context.len() > 255 {
        return Err(Error::Internal(format!("context of {} bytes", context.len())));
    }
    let length16 = u16::try_from(length)
        .map_err(|_| Error::Internal(format!("expand length {}", length)))?;

    let mut info = Vec::with_capacity(4 + full_label_len + context.len());
    info.extend_from_slice(&length16.to_be_bytes());
    info.push(full_label_len as u8);
    info.extend_from_slice(LABEL_PREFIX);
    info.extend_from_slice(label);
    info.push(context.len() as u8);
    info.extend_from_slice(context);

    Ok(Zeroizing::new(kdf.expand(secret, &info, length)?))
}

/// Derive-Secret(Secret, Label, Messages).
pub fn derive_secret(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    messages: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let transcript_hash = digest(provider, prf, messages)?;
    hkdf_expand_label(provider, prf, secret, label, &transcript_hash, prf.output_size())
}

/// PSK for a session ticket: Expand-Label(rms, "resumption", nonce, Hash.length).
pub fn derive_resumption_psk(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    resumption_master_secret: &[u8],
    ticket_nonce: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    prf_kdf(prf)?;
    debug!(prf = prf.name(), nonce_len = ticket_nonce.len(), "deriving resumption PSK");
    hkdf_expand_label(
        provider,
        prf,
        resumption_master_secret,
        RESUMPTION_LABEL,
        ticket_nonce,
        prf.output_size(),
    )
}

/// Early secret: HKDF-Extract(0, PSK).
pub fn early_secret(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    psk: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let kdf = provider.kdf(prf_kdf(prf)?)?;
    Ok(Zeroizing::new(kdf.extract(&[], psk)))
}

/// Binder key: Derive-Secret(early secret, "ext binder" | "res binder", "").
pub fn derive_binder_key(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    psk: &[u8],
    source: PskSource,
) -> Result<Zeroizing<Vec<u8>>> {
    let label = match source {
        PskSource::External => EXT_BINDER_LABEL,
        PskSource::Resumption => RES_BINDER_LABEL,
    };
    let early_secret = early_secret(provider, prf, psk)?;
    derive_secret(provider, prf, &early_secret, label, &[])
}

/// HMAC(Expand-Label(base_key, "finished", "", L), transcript_hash).
pub fn finished_mac(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    base_key: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>> {
    let finished_key =
        hkdf_expand_label(provider, prf, base_key, FINISHED_LABEL, &[], prf.output_size())?;
    let mut mac = provider.hmac(prf, &finished_key)?;
    mac.update(transcript_hash);
    Ok(mac.finalize())
}

/// Finished-style MAC over `transcript`, hashed with the PRF.
pub fn compute_finished(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    base_key: &[u8],
    transcript: &[u8],
) -> Result<Vec<u8>> {
    let transcript_hash = digest(provider, prf, transcript)?;
    finished_mac(provider, prf, base_key, &transcript_hash)
}
