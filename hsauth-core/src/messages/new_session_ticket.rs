//! NewSessionTicket message (RFC 8446 Section 4.6.1).

use crate::codec::{try_copy, HandshakeBuffer, Reader};
use crate::error::{Error, Result};

/// NewSessionTicket body (without the handshake header).
///
/// ```text
/// struct {
///     uint32 ticket_lifetime;
///     uint32 ticket_age_add;
///     opaque ticket_nonce<0..255>;
///     opaque ticket<1..2^16-1>;
///     Extension extensions<0..2^16-2>;
/// } NewSessionTicket;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewSessionTicket {
    pub ticket_lifetime: u32,
    pub ticket_age_add: u32,
    pub ticket_nonce: Vec<u8>,
    pub ticket: Vec<u8>,
    /// Raw extensions block body.
    pub extensions: Vec<u8>,
}

impl NewSessionTicket {
    pub fn encode(&self, buf: &mut HandshakeBuffer) -> Result<()> {
        if self.ticket.is_empty() {
            return Err(Error::Internal("empty ticket".to_string()));
        }
        if self.extensions.len() > 0xfffe {
            return Err(Error::Internal(format!(
                "ticket extensions of {} bytes",
                self.extensions.len()
            )));
        }
        buf.put_u32(self.ticket_lifetime);
        buf.put_u32(self.ticket_age_add);
        buf.put_prefixed8(&self.ticket_nonce)?;
        buf.put_prefixed16(&self.ticket)?;
        buf.put_prefixed16(&self.extensions)?;
        Ok(())
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let ticket_lifetime = r.read_u32()?;
        let ticket_age_add = r.read_u32()?;
        let ticket_nonce = try_copy(r.read_prefixed8()?)?;
        let ticket = r.read_prefixed16()?;
        if ticket.is_empty() {
            return Err(Error::Decode("empty ticket".to_string()));
        }
        let ticket = try_copy(ticket)?;
        let extensions = try_copy(r.read_prefixed16()?)?;
        r.finish("NewSessionTicket")?;
        Ok(Self {
            ticket_lifetime,
            ticket_age_add,
            ticket_nonce,
            ticket,
            extensions,
        })
    }
}
