//! Fixtures shared by the hsauth benchmarks.

use hsauth_core::codec::HandshakeBuffer;
use hsauth_core::extensions::psk_key_exchange_modes;
use hsauth_core::{Config, ProtocolVersion, Role, SecurityState};

/// A TLS 1.3 client session ready to offer a PSK.
pub fn psk_client() -> SecurityState {
    let mut session = SecurityState::new(Role::Client, ProtocolVersion::Tls13, Config::default());
    let mut scratch = HandshakeBuffer::new();
    psk_key_exchange_modes::client_send(&mut session, &mut scratch)
        .expect("default configuration has PSK modes");
    session
}

/// A session at `version` with fixed randoms and a transcript of `transcript_len` bytes.
pub fn signing_session(role: Role, version: ProtocolVersion, transcript_len: usize) -> SecurityState {
    let mut session = SecurityState::new(role, version, Config::default());
    session.client_random = [0x01; 32];
    session.server_random = [0x02; 32];
    session.premaster_secret = zeroize::Zeroizing::new(vec![0x03; 48]);
    session.transcript.append(&vec![0x16; transcript_len]);
    session
}
