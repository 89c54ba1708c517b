//! PSK binders (RFC 8446, Section 4.2.11.2).
//!
//! A binder is a Finished-style MAC keyed from the PSK over the ClientHello
//! truncated just before the binders list. The client computes it before the
//! binders exist, so it hashes a copy of its partial ClientHello whose three
//! enclosing length fields (handshake message, extensions block, PSK
//! extension) are patched as if the binders were already appended. The
//! server hashes the received ClientHello minus its trailing binders block.

use std::borrow::Cow;

use hsauth_crypto::{CryptoProvider, HashAlgorithm};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::codec::{patch_field, try_copy, LengthWidth};
use crate::error::{Error, Result};
use crate::messages::client_hello::ClientHelloLayout;
use crate::protocol::{HandshakeType, HANDSHAKE_HEADER_LEN};
use crate::secrets::{compute_finished, derive_binder_key};
use crate::session::PskSource;

/// Bytes of the uint16 length in front of the binders list.
const BINDERS_PREFIX_LEN: usize = 2;

/// The bytes a binder is computed over.
#[derive(Debug, Clone, Copy)]
pub enum BinderTranscript<'a> {
    /// Client: the ClientHello written so far, binders not yet appended.
    Partial {
        /// Output buffer; the handshake header starts at `layout.message_offset`.
        buffer: &'a [u8],
        /// Where the message and its extensions block sit in `buffer`.
        layout: ClientHelloLayout,
        /// PSK extension body written so far (identities list only).
        psk_extension_len: usize,
        /// Length of the binders list that will follow, without its prefix.
        binders_len: usize,
    },
    /// Server: the ClientHello as received.
    Received {
        /// The complete ClientHello, handshake header included.
        client_hello: &'a [u8],
        /// Length of the trailing binders block, prefix included.
        binders_block_len: usize,
    },
}

impl<'a> BinderTranscript<'a> {
    /// Materialize the pseudo-transcript.
    pub fn build(&self) -> Result<Cow<'a, [u8]>> {
        match *self {
            BinderTranscript::Partial {
                buffer,
                layout,
                psk_extension_len,
                binders_len,
            } => patched_client_hello(buffer, layout, psk_extension_len, binders_len)
                .map(Cow::Owned),
            BinderTranscript::Received {
                client_hello,
                binders_block_len,
            } => {
                let keep = client_hello
                    .len()
                    .checked_sub(binders_block_len)
                    .filter(|keep| *keep >= HANDSHAKE_HEADER_LEN)
                    .ok_or_else(|| {
                        Error::Internal(format!(
                            "binders block of {} bytes exceeds a {}-byte ClientHello",
                            binders_block_len,
                            client_hello.len()
                        ))
                    })?;
                Ok(Cow::Borrowed(&client_hello[..keep]))
            }
        }
    }
}

fn patched_client_hello(
    buffer: &[u8],
    layout: ClientHelloLayout,
    psk_extension_len: usize,
    binders_len: usize,
) -> Result<Vec<u8>> {
    let ext_offset = layout
        .extensions_length_offset
        .checked_sub(layout.message_offset)
        .filter(|offset| *offset > 0)
        .ok_or_else(|| {
            Error::Internal(format!(
                "extensions length at {} does not follow the message start {}",
                layout.extensions_length_offset, layout.message_offset
            ))
        })?;
    let message = buffer.get(layout.message_offset..).ok_or_else(|| {
        Error::Internal(format!(
            "message offset {} beyond a {}-byte buffer",
            layout.message_offset,
            buffer.len()
        ))
    })?;
    let len = message.len();
    if ext_offset + 2 > len {
        return Err(Error::Internal(format!(
            "extensions length at {} beyond a {}-byte message",
            ext_offset, len
        )));
    }
    let psk_length_pos = len
        .checked_sub(psk_extension_len + 2)
        .filter(|pos| *pos >= ext_offset + 2)
        .ok_or_else(|| {
            Error::Internal(format!(
                "PSK extension of {} bytes does not fit the extensions block",
                psk_extension_len
            ))
        })?;

    let binders_block_len = BINDERS_PREFIX_LEN + binders_len;
    let mut copy = try_copy(message)?;
    copy[0] = HandshakeType::ClientHello.to_u8();
    patch_field(
        &mut copy,
        1,
        LengthWidth::U24,
        len + binders_block_len - HANDSHAKE_HEADER_LEN,
    )?;
    patch_field(
        &mut copy,
        ext_offset,
        LengthWidth::U16,
        len + binders_block_len - ext_offset - 2,
    )?;
    patch_field(
        &mut copy,
        psk_length_pos,
        LengthWidth::U16,
        psk_extension_len + binders_block_len,
    )?;
    Ok(copy)
}

/// Compute the binder for `psk` over `transcript`.
///
/// `source` picks the binder key label: "ext binder" for external PSKs,
/// "res binder" for ticket PSKs.
pub fn compute_binder(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    psk: &[u8],
    source: PskSource,
    transcript: &BinderTranscript<'_>,
) -> Result<Vec<u8>> {
    let data = transcript.build()?;
    let binder_key = derive_binder_key(provider, prf, psk, source)?;
    debug!(prf = prf.name(), transcript_len = data.len(), "computing PSK binder");
    compute_finished(provider, prf, &binder_key, &data)
}

/// Recompute the binder and compare it with `received` in constant time.
///
/// # Errors
///
/// [`Error::InsufficientCredentials`] when the binders differ in length or
/// content.
pub fn verify_binder(
    provider: &dyn CryptoProvider,
    prf: HashAlgorithm,
    psk: &[u8],
    source: PskSource,
    transcript: &BinderTranscript<'_>,
    received: &[u8],
) -> Result<()> {
    let expected = compute_binder(provider, prf, psk, source, transcript)?;
    if expected.len() != received.len() || !bool::from(expected.ct_eq(received)) {
        return Err(Error::InsufficientCredentials(
            "PSK binder does not verify".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsauth_crypto_rustcrypto::RustCryptoProvider;

    /// header(4) | body(6) | ext len(2) | other ext(4) | psk type(2) psk len(2) | identities(9)
    fn partial_hello() -> (Vec<u8>, ClientHelloLayout, usize) {
        let mut hello = vec![0x01, 0, 0, 0];
        hello.extend_from_slice(&[3, 3, 0xaa, 0xbb, 0xcc, 0xdd]);
        hello.extend_from_slice(&[0, 0]);
        hello.extend_from_slice(&[0, 43, 0, 0]);
        hello.extend_from_slice(&[0, 41, 0, 0]);
        let identities = [0, 7, 0, 1, b'x', 0, 0, 0, 5];
        hello.extend_from_slice(&identities);
        let layout = ClientHelloLayout {
            message_offset: 0,
            extensions_length_offset: 10,
        };
        (hello, layout, identities.len())
    }

    #[test]
    fn test_patched_lengths() {
        let (hello, layout, psk_len) = partial_hello();
        let binders_len = 33;
        let patched = patched_client_hello(&hello, layout, psk_len, binders_len).unwrap();
        let total = hello.len() + 2 + binders_len;

        assert_eq!(patched.len(), hello.len());
        assert_eq!(&patched[1..4], &((total - 4) as u32).to_be_bytes()[1..]);
        assert_eq!(&patched[10..12], &((total - 12) as u16).to_be_bytes());
        assert_eq!(&patched[18..20], &((psk_len + 2 + binders_len) as u16).to_be_bytes());
        // Everything else is untouched.
        assert_eq!(&patched[4..10], &hello[4..10]);
        assert_eq!(&patched[20..], &hello[20..]);
    }

    #[test]
    fn test_displacement_is_honored() {
        let (hello, layout, psk_len) = partial_hello();
        let mut displaced = vec![0xee; 5];
        displaced.extend_from_slice(&hello);
        let shifted = ClientHelloLayout {
            message_offset: 5,
            extensions_length_offset: layout.extensions_length_offset + 5,
        };
        assert_eq!(
            patched_client_hello(&displaced, shifted, psk_len, 33).unwrap(),
            patched_client_hello(&hello, layout, psk_len, 33).unwrap()
        );
    }

    #[test]
    fn test_bad_offsets_are_internal_errors() {
        let (hello, _, psk_len) = partial_hello();
        let cases = [
            ClientHelloLayout {
                message_offset: 4,
                extensions_length_offset: 4,
            },
            ClientHelloLayout {
                message_offset: 0,
                extensions_length_offset: hello.len(),
            },
            ClientHelloLayout {
                message_offset: hello.len() + 1,
                extensions_length_offset: hello.len() + 2,
            },
        ];
        for layout in cases {
            assert!(matches!(
                patched_client_hello(&hello, layout, psk_len, 33),
                Err(Error::Internal(_))
            ));
        }
        let layout = ClientHelloLayout {
            message_offset: 0,
            extensions_length_offset: 10,
        };
        assert!(matches!(
            patched_client_hello(&hello, layout, hello.len(), 33),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_binder_is_deterministic() {
        let provider = RustCryptoProvider::new();
        let (hello, layout, psk_len) = partial_hello();
        let transcript = BinderTranscript::Partial {
            buffer: &hello,
            layout,
            psk_extension_len: psk_len,
            binders_len: 33,
        };
        let binder = |source| {
            compute_binder(&provider, HashAlgorithm::Sha256, b"psk", source, &transcript).unwrap()
        };
        let a = binder(PskSource::External);
        let b = binder(PskSource::External);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, binder(PskSource::Resumption));
    }

    #[test]
    fn test_received_truncation() {
        let hello = [1u8, 0, 0, 6, 9, 9, 9, 9, 9, 9];
        let transcript = BinderTranscript::Received {
            client_hello: &hello,
            binders_block_len: 3,
        };
        assert_eq!(&*transcript.build().unwrap(), &hello[..7]);

        let too_long = BinderTranscript::Received {
            client_hello: &hello,
            binders_block_len: 7,
        };
        assert!(matches!(too_long.build(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_verify_rejects_short_binder() {
        let provider = RustCryptoProvider::new();
        let hello = [1u8, 0, 0, 6, 9, 9, 9, 9, 9, 9];
        let transcript = BinderTranscript::Received {
            client_hello: &hello,
            binders_block_len: 3,
        };
        let sha256 = HashAlgorithm::Sha256;
        let binder =
            compute_binder(&provider, sha256, b"k", PskSource::Resumption, &transcript).unwrap();
        verify_binder(&provider, sha256, b"k", PskSource::Resumption, &transcript, &binder).unwrap();
        assert!(matches!(
            verify_binder(&provider, sha256, b"k", PskSource::Resumption, &transcript, &binder[..31]),
            Err(Error::InsufficientCredentials(_))
        ));
        assert!(matches!(
            verify_binder(&provider, sha256, b"k", PskSource::External, &transcript, &binder),
            Err(Error::InsufficientCredentials(_))
        ));
    }
}
