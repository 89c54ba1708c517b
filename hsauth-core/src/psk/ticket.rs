//! Client-side session tickets and their packed form.
//!
//! The packed state carries a ticket across a HelloRetryRequest or into a
//! later connection:
//!
//! ```text
//! uint32 lifetime;
//! uint32 age_add;
//! opaque nonce<0..2^32-1>;
//! opaque ticket<0..2^32-1>;
//! opaque resumption_master_secret<0..2^32-1>;
//! ```

use std::fmt;

use hsauth_crypto::{CryptoProvider, HashAlgorithm};
use zeroize::Zeroizing;

use crate::codec::{try_copy, HandshakeBuffer, Reader};
use crate::error::Result;
use crate::messages::new_session_ticket::NewSessionTicket;
use crate::secrets::derive_resumption_psk;

/// A ticket as issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionTicket {
    /// Ticket lifetime in seconds.
    pub lifetime: u32,
    /// Server-chosen value added to the ticket age.
    pub age_add: u32,
    /// Per-ticket nonce fed into the PSK derivation.
    pub nonce: Vec<u8>,
    /// Opaque ticket; sent back verbatim as the PSK identity.
    pub ticket: Vec<u8>,
}

impl SessionTicket {
    /// Age reported on the wire: `lifetime * 1000 + age_add`, modulo 2^32.
    pub fn obfuscated_age(&self) -> u32 {
        let age_ms = u64::from(self.lifetime) * 1000;
        ((age_ms + u64::from(self.age_add)) % (1u64 << 32)) as u32
    }
}

impl From<NewSessionTicket> for SessionTicket {
    fn from(nst: NewSessionTicket) -> Self {
        Self {
            lifetime: nst.ticket_lifetime,
            age_add: nst.ticket_age_add,
            nonce: nst.ticket_nonce,
            ticket: nst.ticket,
        }
    }
}

/// A ticket together with the resumption master secret it unlocks.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PskExtState {
    /// The server's ticket.
    pub ticket: SessionTicket,
    /// Resumption master secret of the issuing session.
    pub resumption_master_secret: Zeroizing<Vec<u8>>,
}

impl PskExtState {
    /// Append the packed form to `buf`.
    pub fn pack(&self, buf: &mut HandshakeBuffer) -> Result<()> {
        buf.put_u32(self.ticket.lifetime);
        buf.put_u32(self.ticket.age_add);
        buf.put_prefixed32(&self.ticket.nonce)?;
        buf.put_prefixed32(&self.ticket.ticket)?;
        buf.put_prefixed32(&self.resumption_master_secret)?;
        Ok(())
    }

    /// Parse a packed state. Trailing bytes are rejected.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let lifetime = r.read_u32()?;
        let age_add = r.read_u32()?;
        let nonce = try_copy(r.read_prefixed32()?)?;
        let ticket = try_copy(r.read_prefixed32()?)?;
        let resumption_master_secret = Zeroizing::new(try_copy(r.read_prefixed32()?)?);
        r.finish("packed ticket")?;
        Ok(Self {
            ticket: SessionTicket {
                lifetime,
                age_add,
                nonce,
                ticket,
            },
            resumption_master_secret,
        })
    }
}

impl fmt::Debug for PskExtState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PskExtState")
            .field("ticket", &self.ticket)
            .field("resumption_master_secret", &"<redacted>")
            .finish()
    }
}

/// A ticket the client can offer, with the PRF of the session that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTicket {
    /// Ticket and secret.
    pub state: PskExtState,
    /// PRF hash of the issuing session.
    pub prf: HashAlgorithm,
}

impl ClientTicket {
    /// Store a received NewSessionTicket.
    pub fn new(
        ticket: impl Into<SessionTicket>,
        resumption_master_secret: Zeroizing<Vec<u8>>,
        prf: HashAlgorithm,
    ) -> Self {
        Self {
            state: PskExtState {
                ticket: ticket.into(),
                resumption_master_secret,
            },
            prf,
        }
    }

    /// Identity to offer.
    pub fn identity(&self) -> &[u8] {
        &self.state.ticket.ticket
    }

    /// PSK for this ticket.
    pub fn derive_psk(&self, provider: &dyn CryptoProvider) -> Result<Zeroizing<Vec<u8>>> {
        derive_resumption_psk(
            provider,
            self.prf,
            &self.state.resumption_master_secret,
            &self.state.ticket.nonce,
        )
    }
}
