//! Two-pass parser for the client's pre_shared_key extension.
//!
//! ```text
//! struct {
//!     opaque identity<1..2^16-1>;
//!     uint32 obfuscated_ticket_age;
//! } PskIdentity;
//!
//! opaque PskBinderEntry<32..255>;
//!
//! struct {
//!     PskIdentity identities<7..2^16-1>;
//!     PskBinderEntry binders<33..2^16-1>;
//! } OfferedPsks;
//! ```
//!
//! Identities are walked in wire order with [`PskExtParser::next_psk`];
//! the binder of the chosen identity is fetched afterwards by index.

use crate::codec::Reader;
use crate::error::{Error, Result};

/// Shortest binder entry allowed on the wire.
pub const MIN_BINDER_LEN: usize = 32;

/// One identity from the offered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferedPsk<'a> {
    /// Opaque identity bytes.
    pub identity: &'a [u8],
    /// Ticket age as sent by the client.
    pub obfuscated_ticket_age: u32,
    /// Position in the identities list.
    pub index: u16,
}

/// Cursor over an OfferedPsks body.
#[derive(Debug, Clone)]
pub struct PskExtParser<'a> {
    identities: Reader<'a>,
    binders_block: &'a [u8],
    next_index: u16,
}

impl<'a> PskExtParser<'a> {
    /// Split the extension body into its identities and binders lists.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] if either list is missing, too short, or followed by
    /// trailing bytes.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let identities = reader.read_prefixed16()?;
        if identities.len() < 7 {
            return Err(Error::Decode(format!(
                "identities list of {} bytes",
                identities.len()
            )));
        }

        let binders_start = reader.position();
        let binders = reader.read_prefixed16()?;
        reader.finish("pre_shared_key")?;
        if binders.len() < MIN_BINDER_LEN + 1 {
            return Err(Error::Decode(format!(
                "binders list of {} bytes",
                binders.len()
            )));
        }

        Ok(Self {
            identities: Reader::new(identities),
            binders_block: &data[binders_start..],
            next_index: 0,
        })
    }

    /// Next identity in wire order, or `None` after the last one.
    pub fn next_psk(&mut self) -> Result<Option<OfferedPsk<'a>>> {
        if self.identities.is_empty() {
            return Ok(None);
        }
        let identity = self.identities.read_prefixed16()?;
        if identity.is_empty() {
            return Err(Error::Decode("empty PSK identity".to_string()));
        }
        let obfuscated_ticket_age = self.identities.read_u32()?;
        let index = self.next_index;
        self.next_index = index
            .checked_add(1)
            .ok_or_else(|| Error::Decode("too many PSK identities".to_string()))?;
        Ok(Some(OfferedPsk {
            identity,
            obfuscated_ticket_age,
            index,
        }))
    }

    /// Binder entry at position `index`.
    pub fn find_binder(&self, index: u16) -> Result<&'a [u8]> {
        let mut block = Reader::new(self.binders_block);
        let mut binders = Reader::new(block.read_prefixed16()?);
        let mut position = 0u16;
        while !binders.is_empty() {
            let binder = binders.read_prefixed8()?;
            if binder.len() < MIN_BINDER_LEN {
                return Err(Error::Decode(format!("binder of {} bytes", binder.len())));
            }
            if position == index {
                return Ok(binder);
            }
            position = position.saturating_add(1);
        }
        Err(Error::Decode(format!("no binder for identity {}", index)))
    }

    /// The binders list including its uint16 prefix; the tail of the ClientHello.
    pub fn binders_block(&self) -> &'a [u8] {
        self.binders_block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::HandshakeBuffer;

    fn offered(identities: &[(&[u8], u32)], binders: &[&[u8]]) -> Vec<u8> {
        let mut buf = HandshakeBuffer::new();
        let mut list = HandshakeBuffer::new();
        for (identity, age) in identities {
            list.put_prefixed16(identity).unwrap();
            list.put_u32(*age);
        }
        buf.put_prefixed16(list.as_bytes()).unwrap();
        let mut list = HandshakeBuffer::new();
        for binder in binders {
            list.put_prefixed8(binder).unwrap();
        }
        buf.put_prefixed16(list.as_bytes()).unwrap();
        buf.into_vec()
    }

    #[test]
    fn test_walks_identities_in_order() {
        let data = offered(&[(b"first", 1), (b"second", 2)], &[&[1; 32], &[2; 48]]);
        let mut parser = PskExtParser::new(&data).unwrap();

        let a = parser.next_psk().unwrap().unwrap();
        assert_eq!((a.identity, a.obfuscated_ticket_age, a.index), (&b"first"[..], 1, 0));
        let b = parser.next_psk().unwrap().unwrap();
        assert_eq!((b.identity, b.index), (&b"second"[..], 1));
        assert_eq!(parser.next_psk().unwrap(), None);

        assert_eq!(parser.find_binder(1).unwrap(), &[2; 48][..]);
        assert_eq!(parser.find_binder(0).unwrap(), &[1; 32][..]);
        assert!(matches!(parser.find_binder(2), Err(Error::Decode(_))));
        assert_eq!(parser.binders_block().len(), 2 + 33 + 49);
    }

    #[test]
    fn test_rejects_malformed_lists() {
        // Identities list too short.
        assert!(PskExtParser::new(&[0, 0, 0, 33]).is_err());
        // Binders missing.
        let data = offered(&[(b"id", 0)], &[]);
        assert!(matches!(PskExtParser::new(&data), Err(Error::Decode(_))));
        // Trailing garbage.
        let mut data = offered(&[(b"id", 0)], &[&[0; 32]]);
        data.push(0);
        assert!(matches!(PskExtParser::new(&data), Err(Error::Decode(_))));
    }

    #[test]
    fn test_rejects_short_binder_entry() {
        let data = offered(&[(b"id", 0), (b"id2", 0)], &[&[0; 31], &[0; 2]]);
        let parser = PskExtParser::new(&data).unwrap();
        assert!(matches!(parser.find_binder(0), Err(Error::Decode(_))));
    }

    #[test]
    fn test_truncated_identity_is_decode_error() {
        // identities<7> holding a 5-byte identity without its age.
        let mut data = vec![0, 7, 0, 5, 1, 2, 3, 4, 5];
        data.extend_from_slice(&[0, 33, 32]);
        data.extend_from_slice(&[0; 32]);
        let mut parser = PskExtParser::new(&data).unwrap();
        assert!(matches!(parser.next_psk(), Err(Error::Decode(_))));
    }
}
