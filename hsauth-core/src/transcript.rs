//! Handshake transcript buffer.
//!
//! Legacy signatures hash the raw concatenation of handshake messages, and a
//! CertificateVerify is checked against everything received before it, so
//! the transcript keeps the bytes themselves rather than a running hash.
//! `prev_len` marks where the most recently appended message starts.

use hsauth_crypto::{CryptoProvider, HashAlgorithm};

use crate::error::Result;

/// Append-only record of the handshake messages sent and received.
#[derive(Debug, Clone, Default)]
pub struct HandshakeTranscript {
    buffer: Vec<u8>,
    prev_len: usize,
}

impl HandshakeTranscript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a complete handshake message (header included).
    pub fn append(&mut self, message: &[u8]) {
        self.prev_len = self.buffer.len();
        self.buffer.extend_from_slice(message);
    }

    /// Every byte appended so far.
    pub fn full(&self) -> &[u8] {
        &self.buffer
    }

    /// Everything before the most recently appended message.
    pub fn up_to_previous(&self) -> &[u8] {
        &self.buffer[..self.prev_len]
    }

    /// Length of [`HandshakeTranscript::full`].
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Length of [`HandshakeTranscript::up_to_previous`].
    pub fn prev_len(&self) -> usize {
        self.prev_len
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop the transcript at the end of the handshake.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.prev_len = 0;
    }
}

/// Hash `data` with the provider.
pub fn digest(provider: &dyn CryptoProvider, algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
    let mut hash = provider.hash(algorithm)?;
    hash.update(data);
    Ok(hash.finalize())
}
