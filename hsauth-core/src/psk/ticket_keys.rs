//! Server-side session ticket sealing (RFC 8446 Section 4.6.1).
//!
//! Tickets are self-contained: the resumption master secret, ticket nonce
//! and PRF of the issuing session are sealed with AES-256-GCM under a
//! rotating server key and handed to the client as the opaque ticket.
//!
//! # Ticket Format
//!
//! ```text
//! struct SealedTicket {
//!     uint8 version;          // TICKET_VERSION
//!     uint8 key_id;           // selects the ring key
//!     opaque nonce[12];       // GCM nonce
//!     opaque sealed<..>;      // AES-256-GCM(payload), tag appended
//! }
//!
//! struct TicketPayload {
//!     uint8 prf;                               // TLS 1.2 HashAlgorithm id
//!     opaque resumption_master_secret<0..2^16-1>;
//!     opaque ticket_nonce<0..255>;
//!     uint64 issued_at;                        // UNIX seconds
//! }
//! ```
//!
//! The additional data is `version || key_id`.

use std::time::{SystemTime, UNIX_EPOCH};

use hsauth_crypto::{AeadAlgorithm, CryptoProvider, HashAlgorithm};
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::{try_copy, HandshakeBuffer, Reader};
use crate::error::{Error, Result};
use crate::messages::new_session_ticket::NewSessionTicket;
use crate::secrets::prf_kdf;
use crate::{check_ticket_lifetime, Config};

/// Current ticket format version.
pub const TICKET_VERSION: u8 = 1;

/// Ticket sealing key size (AES-256).
pub const TICKET_KEY_SIZE: usize = 32;

/// Default lifetime of a sealing key, in seconds.
pub const DEFAULT_KEY_LIFETIME: u64 = 24 * 60 * 60;

/// Size of the per-ticket nonce handed to the client.
pub const TICKET_NONCE_SIZE: usize = 8;

const GCM_NONCE_SIZE: usize = 12;
const GCM_TAG_SIZE: usize = 16;
const HEADER_SIZE: usize = 2 + GCM_NONCE_SIZE;
const MAX_PREVIOUS_KEYS: usize = 3;

/// Current time in UNIX seconds; 0 if the clock is before the epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A sealing key with its validity window.
#[derive(Clone)]
pub struct TicketKey {
    key_id: u8,
    key: Zeroizing<[u8; TICKET_KEY_SIZE]>,
    created_at: u64,
    lifetime: u64,
}

impl TicketKey {
    /// Key from existing material.
    pub fn from_bytes(key_id: u8, key: [u8; TICKET_KEY_SIZE], created_at: u64, lifetime: u64) -> Self {
        Self {
            key_id,
            key: Zeroizing::new(key),
            created_at,
            lifetime,
        }
    }

    fn generate(provider: &dyn CryptoProvider, key_id: u8, lifetime: u64, now: u64) -> Result<Self> {
        let mut key = Zeroizing::new([0u8; TICKET_KEY_SIZE]);
        provider.random().fill(&mut key[..])?;
        Ok(Self {
            key_id,
            key,
            created_at: now,
            lifetime,
        })
    }

    /// Identifier carried in sealed tickets.
    pub fn key_id(&self) -> u8 {
        self.key_id
    }

    /// Whether the key still opens tickets at `now`.
    pub fn is_valid_at(&self, now: u64) -> bool {
        now < self.created_at.saturating_add(self.lifetime)
    }

    /// Past 75% of its lifetime.
    pub fn should_rotate_at(&self, now: u64) -> bool {
        now.saturating_sub(self.created_at) >= self.lifetime / 4 * 3
    }
}

impl std::fmt::Debug for TicketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketKey")
            .field("key_id", &self.key_id)
            .field("created_at", &self.created_at)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Contents recovered from a sealed ticket.
#[derive(Clone, PartialEq, Eq)]
pub struct OpenedTicket {
    /// Resumption master secret of the issuing session.
    pub resumption_master_secret: Zeroizing<Vec<u8>>,
    /// Ticket nonce sent alongside the ticket.
    pub nonce: Vec<u8>,
    /// PRF of the issuing session.
    pub prf: HashAlgorithm,
    /// Issue time, UNIX seconds.
    pub issued_at: u64,
}

impl std::fmt::Debug for OpenedTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedTicket")
            .field("prf", &self.prf)
            .field("nonce_len", &self.nonce.len())
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// Turns a PSK identity back into ticket contents.
///
/// `None` means the identity is not one of ours, or no longer valid; the
/// server then moves on to the next offered identity.
pub trait TicketDecrypter {
    /// Open `identity` as a session ticket.
    fn open_ticket(&self, provider: &dyn CryptoProvider, identity: &[u8]) -> Option<OpenedTicket>;
}

/// Rotating set of ticket sealing keys.
///
/// The current key seals new tickets; up to three previous keys still open
/// tickets issued before a rotation.
#[derive(Debug)]
pub struct TicketKeyRing {
    current: TicketKey,
    previous: Vec<TicketKey>,
    ticket_lifetime: u32,
}

impl TicketKeyRing {
    /// A ring with a fresh random key.
    ///
    /// Issued tickets advertise `config.ticket_lifetime` seconds and are
    /// accepted for that long.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for a lifetime outside
    /// `1..=MAX_TICKET_LIFETIME`.
    pub fn new(provider: &dyn CryptoProvider, config: &Config, key_lifetime: u64) -> Result<Self> {
        Self::with_key(
            TicketKey::generate(provider, 0, key_lifetime, unix_now())?,
            config,
        )
    }

    /// A ring starting from `key`.
    pub fn with_key(key: TicketKey, config: &Config) -> Result<Self> {
        Ok(Self {
            current: key,
            previous: Vec::new(),
            ticket_lifetime: check_ticket_lifetime(config.ticket_lifetime)?,
        })
    }

    /// Lifetime advertised in issued tickets.
    pub fn ticket_lifetime(&self) -> u32 {
        self.ticket_lifetime
    }

    /// Id of the key sealing new tickets.
    pub fn current_key_id(&self) -> u8 {
        self.current.key_id
    }

    /// Number of retired keys still accepted.
    pub fn previous_key_count(&self) -> usize {
        self.previous.len()
    }

    /// Replace the current key with a fresh one.
    pub fn rotate(&mut self, provider: &dyn CryptoProvider) -> Result<()> {
        self.rotate_at(provider, unix_now())
    }

    /// [`rotate`](Self::rotate) with an explicit clock.
    pub fn rotate_at(&mut self, provider: &dyn CryptoProvider, now: u64) -> Result<()> {
        let next = TicketKey::generate(
            provider,
            self.current.key_id.wrapping_add(1),
            self.current.lifetime,
            now,
        )?;
        let old = std::mem::replace(&mut self.current, next);
        debug!(retired = old.key_id, current = self.current.key_id, "rotated ticket key");
        self.previous.push(old);
        self.previous.retain(|key| key.is_valid_at(now));
        if self.previous.len() > MAX_PREVIOUS_KEYS {
            let excess = self.previous.len() - MAX_PREVIOUS_KEYS;
            self.previous.drain(..excess);
        }
        Ok(())
    }

    /// Rotate if the current key is past 75% of its lifetime.
    pub fn maybe_rotate(&mut self, provider: &dyn CryptoProvider) -> Result<()> {
        let now = unix_now();
        if self.current.should_rotate_at(now) {
            self.rotate_at(provider, now)?;
        }
        Ok(())
    }

    /// Issue a NewSessionTicket for a completed handshake.
    ///
    /// Returns the message; the client derives the ticket PSK from
    /// `resumption_master_secret` and the message's nonce.
    pub fn issue_ticket(
        &self,
        provider: &dyn CryptoProvider,
        resumption_master_secret: &[u8],
        prf: HashAlgorithm,
    ) -> Result<NewSessionTicket> {
        self.issue_ticket_at(provider, resumption_master_secret, prf, unix_now())
    }

    /// [`issue_ticket`](Self::issue_ticket) with an explicit clock.
    pub fn issue_ticket_at(
        &self,
        provider: &dyn CryptoProvider,
        resumption_master_secret: &[u8],
        prf: HashAlgorithm,
        now: u64,
    ) -> Result<NewSessionTicket> {
        let ticket_nonce = provider.random().generate(TICKET_NONCE_SIZE)?;
        let ticket_age_add = provider.random().next_u32()?;
        let ticket = self.seal_at(provider, resumption_master_secret, &ticket_nonce, prf, now)?;
        Ok(NewSessionTicket {
            ticket_lifetime: self.ticket_lifetime,
            ticket_age_add,
            ticket_nonce,
            ticket,
            extensions: Vec::new(),
        })
    }

    /// Seal ticket contents under the current key.
    pub fn seal_at(
        &self,
        provider: &dyn CryptoProvider,
        resumption_master_secret: &[u8],
        ticket_nonce: &[u8],
        prf: HashAlgorithm,
        now: u64,
    ) -> Result<Vec<u8>> {
        prf_kdf(prf)?;
        let prf_id = prf
            .tls12_id()
            .ok_or_else(|| Error::Internal(format!("{} has no wire id", prf.name())))?;

        let mut payload = HandshakeBuffer::with_capacity(12 + resumption_master_secret.len());
        payload.put_u8(prf_id);
        payload.put_prefixed16(resumption_master_secret)?;
        payload.put_prefixed8(ticket_nonce)?;
        payload.put_u64(now);
        let payload = Zeroizing::new(payload.into_vec());

        let mut nonce = [0u8; GCM_NONCE_SIZE];
        provider.random().fill(&mut nonce)?;
        let aad = [TICKET_VERSION, self.current.key_id];
        let aead = provider.aead(AeadAlgorithm::Aes256Gcm)?;
        let sealed = aead.seal(&self.current.key[..], &nonce, &aad, &payload)?;

        let mut ticket = Vec::with_capacity(HEADER_SIZE + sealed.len());
        ticket.extend_from_slice(&aad);
        ticket.extend_from_slice(&nonce);
        ticket.extend_from_slice(&sealed);
        Ok(ticket)
    }

    /// Open a sealed ticket, checking key validity and ticket age at `now`.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] for malformed tickets and
    /// [`Error::InsufficientCredentials`] for unknown keys, failed
    /// authentication or expiry.
    pub fn open_at(&self, provider: &dyn CryptoProvider, ticket: &[u8], now: u64) -> Result<OpenedTicket> {
        if ticket.len() < HEADER_SIZE + GCM_TAG_SIZE {
            return Err(Error::Decode(format!("ticket of {} bytes", ticket.len())));
        }
        let (aad, rest) = ticket.split_at(2);
        let (nonce, sealed) = rest.split_at(GCM_NONCE_SIZE);
        if aad[0] != TICKET_VERSION {
            return Err(Error::Decode(format!("ticket version {}", aad[0])));
        }

        let key = std::iter::once(&self.current)
            .chain(self.previous.iter())
            .find(|key| key.key_id == aad[1])
            .ok_or_else(|| Error::InsufficientCredentials(format!("unknown ticket key {}", aad[1])))?;
        if !key.is_valid_at(now) {
            return Err(Error::InsufficientCredentials("ticket key expired".to_string()));
        }

        let aead = provider.aead(AeadAlgorithm::Aes256Gcm)?;
        let payload = Zeroizing::new(
            aead.open(&key.key[..], nonce, aad, sealed)
                .map_err(|_| Error::InsufficientCredentials("ticket does not authenticate".to_string()))?,
        );

        let mut r = Reader::new(&payload);
        let prf = HashAlgorithm::from_tls12_id(r.read_u8()?)
            .ok_or_else(|| Error::Decode("ticket PRF".to_string()))?;
        let resumption_master_secret = Zeroizing::new(try_copy(r.read_prefixed16()?)?);
        let ticket_nonce = try_copy(r.read_prefixed8()?)?;
        let issued_at = r.read_u64()?;
        r.finish("ticket payload")?;

        if now.saturating_sub(issued_at) > u64::from(self.ticket_lifetime) {
            return Err(Error::InsufficientCredentials("ticket expired".to_string()));
        }

        Ok(OpenedTicket {
            resumption_master_secret,
            nonce: ticket_nonce,
            prf,
            issued_at,
        })
    }
}

impl TicketDecrypter for TicketKeyRing {
    fn open_ticket(&self, provider: &dyn CryptoProvider, identity: &[u8]) -> Option<OpenedTicket> {
        match self.open_at(provider, identity, unix_now()) {
            Ok(opened) => Some(opened),
            Err(err) => {
                debug!(error = %err, "identity is not a usable ticket");
                None
            }
        }
    }
}
