//! psk_key_exchange_modes extension (RFC 8446 Section 4.2.9).
//!
//! ```text
//! enum { psk_ke(0), psk_dhe_ke(1), (255) } PskKeyExchangeMode;
//!
//! struct {
//!     PskKeyExchangeMode ke_modes<1..255>;
//! } PskKeyExchangeModes;
//! ```
//!
//! A client that sends no modes cannot offer a PSK, and a server that
//! received none must not accept one.

use tracing::debug;

use crate::codec::{HandshakeBuffer, Reader};
use crate::error::{Error, ExtensionOutcome, Result};
use crate::protocol::Role;
use crate::session::{PskState, SecurityState};

/// PSK key exchange mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PskKeyExchangeMode {
    /// PSK-only key exchange (no (EC)DHE)
    PskKe = 0,
    /// PSK with (EC)DHE key exchange
    PskDheKe = 1,
}

impl PskKeyExchangeMode {
    /// Convert from wire format.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PskKeyExchangeMode::PskKe),
            1 => Some(PskKeyExchangeMode::PskDheKe),
            _ => None,
        }
    }

    /// Convert to wire format.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Write the configured modes and arm PSK offering.
pub fn client_send(session: &mut SecurityState, buf: &mut HandshakeBuffer) -> Result<ExtensionOutcome> {
    if session.role() != Role::Client {
        return Ok(ExtensionOutcome::NotApplicable);
    }
    let modes = session.config().psk_key_exchange_modes.clone();
    if modes.is_empty() {
        return Ok(ExtensionOutcome::NotApplicable);
    }

    let wire: Vec<u8> = modes.iter().map(|m| m.to_u8()).collect();
    buf.put_prefixed8(&wire)?;
    session.set_psk_state(PskState::ModesSent(modes));
    Ok(ExtensionOutcome::Written(1 + wire.len()))
}

/// Parse the client's modes and keep those the configuration allows.
///
/// # Errors
///
/// [`Error::Decode`] for an empty or malformed list,
/// [`Error::UnexpectedExtension`] when received by a client.
pub fn server_recv(session: &mut SecurityState, data: &[u8]) -> Result<()> {
    if session.role() != Role::Server {
        return Err(Error::UnexpectedExtension(
            "psk_key_exchange_modes from a server".to_string(),
        ));
    }

    let mut r = Reader::new(data);
    let offered = r.read_prefixed8()?;
    r.finish("psk_key_exchange_modes")?;
    if offered.is_empty() {
        return Err(Error::Decode("empty psk_key_exchange_modes".to_string()));
    }

    let offered: Vec<PskKeyExchangeMode> = offered
        .iter()
        .filter_map(|b| PskKeyExchangeMode::from_u8(*b))
        .collect();
    let accepted: Vec<PskKeyExchangeMode> = session
        .config()
        .psk_key_exchange_modes
        .iter()
        .copied()
        .filter(|m| offered.contains(m))
        .collect();

    debug!(?offered, ?accepted, "received psk_key_exchange_modes");
    if !accepted.is_empty() {
        session.set_psk_state(PskState::ModesReceived(accepted));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolVersion;
    use crate::Config;

    fn state(role: Role) -> SecurityState {
        SecurityState::new(role, ProtocolVersion::Tls13, Config::default())
    }

    #[test]
    fn test_client_send_arms_psk() {
        let mut session = state(Role::Client);
        let mut buf = HandshakeBuffer::new();
        let outcome = client_send(&mut session, &mut buf).unwrap();
        assert_eq!(outcome, ExtensionOutcome::Written(2));
        assert_eq!(buf.as_bytes(), &[1, 1]);
        assert_eq!(
            session.psk_state(),
            &PskState::ModesSent(vec![PskKeyExchangeMode::PskDheKe])
        );
    }

    #[test]
    fn test_server_does_not_send() {
        let mut session = state(Role::Server);
        let mut buf = HandshakeBuffer::new();
        assert_eq!(
            client_send(&mut session, &mut buf).unwrap(),
            ExtensionOutcome::NotApplicable
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_server_recv_filters_modes() {
        let mut session = state(Role::Server);
        server_recv(&mut session, &[3, 7, 0, 1]).unwrap();
        assert_eq!(
            session.psk_state(),
            &PskState::ModesReceived(vec![PskKeyExchangeMode::PskDheKe])
        );

        let mut session = state(Role::Server);
        server_recv(&mut session, &[1, 0]).unwrap();
        assert_eq!(session.psk_state(), &PskState::Inactive);
    }

    #[test]
    fn test_server_recv_rejects_malformed() {
        let mut session = state(Role::Server);
        assert!(matches!(server_recv(&mut session, &[0]), Err(Error::Decode(_))));
        assert!(matches!(server_recv(&mut session, &[2, 1]), Err(Error::Decode(_))));
        assert!(matches!(server_recv(&mut session, &[1, 1, 9]), Err(Error::Decode(_))));

        let mut client = state(Role::Client);
        assert!(matches!(
            server_recv(&mut client, &[1, 1]),
            Err(Error::UnexpectedExtension(_))
        ));
    }
}
