//! ClientHello message (RFC 8446 Section 4.1.2).
//!
//! ```text
//! struct {
//!     ProtocolVersion legacy_version = 0x0303;    /* TLS v1.2 */
//!     Random random;
//!     opaque legacy_session_id<0..32>;
//!     CipherSuite cipher_suites<2..2^16-2>;
//!     opaque legacy_compression_methods<1..2^8-1>;
//!     Extension extensions<8..2^16-1>;
//! } ClientHello;
//! ```
//!
//! The message is written straight into the caller's output buffer, which
//! may already hold other data (a record header, a DTLS header). The
//! handshake and extensions lengths are patched when the message is
//! finished, so extensions can be written in place; the pre_shared_key
//! extension relies on this to compute its binder last.

use crate::codec::{HandshakeBuffer, LengthSlot, LengthWidth};
use crate::error::{Error, Result};
use crate::protocol::{HandshakeType, ProtocolVersion};

/// Where a ClientHello under construction sits in its output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHelloLayout {
    /// Offset of the 4-byte handshake header.
    pub message_offset: usize,
    /// Absolute offset of the uint16 extensions-block length.
    pub extensions_length_offset: usize,
}

/// In-place ClientHello writer.
#[derive(Debug)]
#[must_use = "a started ClientHello must be finished"]
pub struct ClientHelloWriter {
    layout: ClientHelloLayout,
    message_length: LengthSlot,
    extensions_length: LengthSlot,
    open_extension: Option<(usize, LengthSlot)>,
}

impl ClientHelloWriter {
    /// Write everything up to and including the (reserved) extensions length.
    pub fn begin(
        buf: &mut HandshakeBuffer,
        random: &[u8; 32],
        session_id: &[u8],
        cipher_suites: &[u16],
    ) -> Result<Self> {
        if session_id.len() > 32 {
            return Err(Error::Internal(format!("session id of {} bytes", session_id.len())));
        }
        if cipher_suites.is_empty() {
            return Err(Error::Internal("no cipher suites".to_string()));
        }

        let message_offset = buf.len();
        buf.put_u8(HandshakeType::ClientHello.to_u8());
        let message_length = buf.reserve_length(LengthWidth::U24);

        buf.put_u16(ProtocolVersion::Tls12.to_u16());
        buf.put_slice(random);
        buf.put_prefixed8(session_id)?;
        let suites = buf.reserve_length(LengthWidth::U16);
        for suite in cipher_suites {
            buf.put_u16(*suite);
        }
        buf.close_length(suites)?;
        buf.put_prefixed8(&[0])?;

        let extensions_length = buf.reserve_length(LengthWidth::U16);
        Ok(Self {
            layout: ClientHelloLayout {
                message_offset,
                extensions_length_offset: extensions_length.offset(),
            },
            message_length,
            extensions_length,
            open_extension: None,
        })
    }

    /// Offsets needed by binder computation.
    pub fn layout(&self) -> ClientHelloLayout {
        self.layout
    }

    /// Write an extension header; the body follows until
    /// [`finish_extension`](Self::finish_extension).
    pub fn start_extension(&mut self, buf: &mut HandshakeBuffer, extension_type: u16) -> Result<()> {
        if self.open_extension.is_some() {
            return Err(Error::Internal("extension already open".to_string()));
        }
        let start = buf.len();
        buf.put_u16(extension_type);
        let slot = buf.reserve_length(LengthWidth::U16);
        self.open_extension = Some((start, slot));
        Ok(())
    }

    /// Patch the open extension's length; returns the body length.
    pub fn finish_extension(&mut self, buf: &mut HandshakeBuffer) -> Result<usize> {
        let (_, slot) = self
            .open_extension
            .take()
            .ok_or_else(|| Error::Internal("no open extension".to_string()))?;
        buf.close_length(slot)
    }

    /// Drop the open extension, header included.
    pub fn abandon_extension(&mut self, buf: &mut HandshakeBuffer) {
        if let Some((start, _slot)) = self.open_extension.take() {
            buf.truncate(start);
        }
    }

    /// Patch the handshake and extensions lengths; returns the message length
    /// including its header.
    pub fn finish(mut self, buf: &mut HandshakeBuffer) -> Result<usize> {
        if self.open_extension.is_some() {
            self.finish_extension(buf)?;
        }
        buf.close_length(self.extensions_length)?;
        buf.close_length(self.message_length)?;
        Ok(buf.len() - self.layout.message_offset)
    }
}
