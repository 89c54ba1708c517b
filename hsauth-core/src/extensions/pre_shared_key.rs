//! pre_shared_key extension (RFC 8446 Section 4.2.11).
//!
//! ```text
//! struct {
//!     select (Handshake.msg_type) {
//!         case client_hello: OfferedPsks;
//!         case server_hello: uint16 selected_identity;
//!     };
//! } PreSharedKeyExtension;
//! ```
//!
//! The client offers a single identity: the external PSK when one is
//! configured, otherwise a stored session ticket. Because the binder covers
//! the ClientHello up to the binders themselves, this extension must be the
//! last one written and the last one in the received ClientHello.

use hsauth_crypto::{CryptoProvider, HashAlgorithm};
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::{HandshakeBuffer, LengthWidth, Reader};
use crate::error::{Error, ExtensionOutcome, Result};
use crate::messages::ClientHelloLayout;
use crate::protocol::Role;
use crate::psk::{
    compute_binder, verify_binder, BinderTranscript, ClientPskCredentials, ClientTicket,
    PskExtParser, ServerPskCredentials, TicketDecrypter,
};
use crate::secrets::{derive_resumption_psk, prf_kdf};
use crate::session::{NegotiatedPsk, PskSource, PskState, SecurityState};

/// Longest identity that can be offered.
pub const MAX_IDENTITY_LEN: usize = 0xffff;

/// Check an identity against `opaque identity<1..2^16-1>`.
pub fn validate_identity(identity: &[u8]) -> Result<()> {
    if identity.is_empty() || identity.len() > MAX_IDENTITY_LEN {
        return Err(Error::InvalidCredential(format!(
            "PSK identity of {} bytes",
            identity.len()
        )));
    }
    Ok(())
}

struct Candidate {
    identity: Vec<u8>,
    key: Zeroizing<Vec<u8>>,
    prf: HashAlgorithm,
    obfuscated_age: u32,
    source: PskSource,
}

fn client_candidate(
    provider: &dyn CryptoProvider,
    credentials: Option<&ClientPskCredentials>,
    ticket: Option<&ClientTicket>,
) -> Result<Option<Candidate>> {
    if let Some(credentials) = credentials {
        let prf = credentials.binder_prf();
        prf_kdf(prf)?;
        let (identity, key) = credentials.credentials()?;
        return Ok(Some(Candidate {
            identity,
            key,
            prf,
            obfuscated_age: 0,
            source: PskSource::External,
        }));
    }
    if let Some(ticket) = ticket {
        return Ok(Some(Candidate {
            identity: ticket.identity().to_vec(),
            key: ticket.derive_psk(provider)?,
            prf: ticket.prf,
            obfuscated_age: ticket.state.ticket.obfuscated_age(),
            source: PskSource::Resumption,
        }));
    }
    Ok(None)
}

/// Offer a PSK in the ClientHello being written into `buf`.
///
/// The extension header must already be in `buf` (see
/// [`ClientHelloWriter::start_extension`](crate::messages::ClientHelloWriter::start_extension))
/// and nothing may follow it. On error `buf` is restored to its length on
/// entry.
pub fn client_send(
    session: &mut SecurityState,
    provider: &dyn CryptoProvider,
    credentials: Option<&ClientPskCredentials>,
    ticket: Option<&ClientTicket>,
    buf: &mut HandshakeBuffer,
    layout: ClientHelloLayout,
) -> Result<ExtensionOutcome> {
    if session.role() != Role::Client {
        return Err(Error::Internal("client_send on a server".to_string()));
    }
    if !matches!(session.psk_state(), PskState::ModesSent(_)) {
        return Ok(ExtensionOutcome::NotApplicable);
    }

    let start = buf.len();
    match write_offer(provider, credentials, ticket, buf, layout, start) {
        Ok(Some(psk)) => {
            debug!(source = ?psk.source(), prf = psk.prf().name(), "offered PSK");
            session.set_psk_state(PskState::Offered(psk));
            Ok(ExtensionOutcome::Written(buf.len() - start))
        }
        Ok(None) => Ok(ExtensionOutcome::NotApplicable),
        Err(err) => {
            buf.truncate(start);
            Err(err)
        }
    }
}

fn write_offer(
    provider: &dyn CryptoProvider,
    credentials: Option<&ClientPskCredentials>,
    ticket: Option<&ClientTicket>,
    buf: &mut HandshakeBuffer,
    layout: ClientHelloLayout,
    start: usize,
) -> Result<Option<NegotiatedPsk>> {
    let Some(candidate) = client_candidate(provider, credentials, ticket)? else {
        return Ok(None);
    };
    validate_identity(&candidate.identity)?;

    // identities<2> + identity<2+n> + age<4> + binders<2> + binder<1+hash>
    let hash_size = candidate.prf.output_size();
    let binders_len = 1 + hash_size;
    let body_len = 2 + 2 + candidate.identity.len() + 4 + 2 + binders_len;
    let extensions_before = start.saturating_sub(layout.extensions_length_offset + 2);
    let limit = LengthWidth::U16.max_value();
    if body_len > limit || extensions_before + body_len > limit {
        return Err(Error::InvalidCredential(format!(
            "PSK identity of {} bytes does not fit the ClientHello extensions",
            candidate.identity.len()
        )));
    }

    let identities = buf.reserve_length(LengthWidth::U16);
    buf.put_prefixed16(&candidate.identity)?;
    buf.put_u32(candidate.obfuscated_age);
    buf.close_length(identities)?;

    let binder = compute_binder(
        provider,
        candidate.prf,
        &candidate.key,
        candidate.source,
        &BinderTranscript::Partial {
            buffer: buf.as_bytes(),
            layout,
            psk_extension_len: buf.len() - start,
            binders_len,
        },
    )?;

    let binders = buf.reserve_length(LengthWidth::U16);
    buf.put_prefixed8(&binder)?;
    buf.close_length(binders)?;

    Ok(Some(NegotiatedPsk::new(
        candidate.key,
        candidate.prf,
        candidate.source,
        0,
    )))
}

/// Look for an acceptable PSK in the client's offer and verify its binder.
///
/// `client_hello` is the complete received ClientHello, handshake header
/// included. Returns the selected index, or `None` when no identity matched
/// and the handshake continues without a PSK.
///
/// # Errors
///
/// - [`Error::UnexpectedExtension`] if no psk_key_exchange_modes were accepted
/// - [`Error::Decode`] for a malformed offer
/// - [`Error::IllegalParameter`] if the binders are not the end of the ClientHello
/// - [`Error::InsufficientCredentials`] if the binder does not verify
pub fn server_recv(
    session: &mut SecurityState,
    provider: &dyn CryptoProvider,
    credentials: Option<&ServerPskCredentials>,
    tickets: Option<&dyn TicketDecrypter>,
    data: &[u8],
    client_hello: &[u8],
) -> Result<Option<u16>> {
    if session.role() != Role::Server {
        return Err(Error::Internal("server_recv on a client".to_string()));
    }
    if !matches!(session.psk_state(), PskState::ModesReceived(_)) {
        return Err(Error::UnexpectedExtension(
            "pre_shared_key without psk_key_exchange_modes".to_string(),
        ));
    }

    let external = match credentials {
        Some(credentials) => credentials
            .hint_entry()?
            .map(|(hint, key)| (hint, key, credentials.binder_prf())),
        None => None,
    };

    let mut parser = PskExtParser::new(data)?;
    let mut chosen = None;
    while let Some(offered) = parser.next_psk()? {
        if let Some((hint, key, prf)) = external {
            if hint.len() == offered.identity.len() && bool::from(hint.ct_eq(offered.identity)) {
                chosen = Some((offered.index, key.clone(), prf, PskSource::External));
                break;
            }
        }
        if let Some(opened) = tickets.and_then(|t| t.open_ticket(provider, offered.identity)) {
            let key = derive_resumption_psk(
                provider,
                opened.prf,
                &opened.resumption_master_secret,
                &opened.nonce,
            )
            .map_err(|err| Error::InsufficientCredentials(format!("ticket PSK: {}", err)))?;
            chosen = Some((offered.index, key, opened.prf, PskSource::Resumption));
            break;
        }
        debug!(index = offered.index, "skipping unknown PSK identity");
    }

    let Some((index, key, prf, source)) = chosen else {
        debug!("no offered PSK is acceptable");
        return Ok(None);
    };

    let binder = parser.find_binder(index)?;
    let binders_block = parser.binders_block();
    if !client_hello.ends_with(binders_block) {
        return Err(Error::IllegalParameter(
            "pre_shared_key is not the last extension".to_string(),
        ));
    }
    verify_binder(
        provider,
        prf,
        &key,
        source,
        &BinderTranscript::Received {
            client_hello,
            binders_block_len: binders_block.len(),
        },
        binder,
    )?;

    debug!(index, source = ?source, "selected PSK");
    session.set_psk_state(PskState::Selected(NegotiatedPsk::new(key, prf, source, index)));
    if source == PskSource::Resumption {
        session.set_resumption_requested();
    }
    Ok(Some(index))
}

/// Write `selected_identity` into the ServerHello if a PSK was selected.
pub fn server_send(session: &SecurityState, buf: &mut HandshakeBuffer) -> Result<ExtensionOutcome> {
    if session.role() != Role::Server {
        return Err(Error::Internal("server_send on a client".to_string()));
    }
    match session.psk_selected_index() {
        Some(index) => {
            buf.put_u16(index);
            Ok(ExtensionOutcome::Written(2))
        }
        None => Ok(ExtensionOutcome::NotApplicable),
    }
}

/// Process the server's `selected_identity`.
///
/// # Errors
///
/// - [`Error::Decode`] unless the body is exactly two bytes
/// - [`Error::IllegalParameter`] for an index that was not offered
/// - [`Error::UnexpectedExtension`] if no psk_key_exchange_modes were sent
pub fn client_recv(session: &mut SecurityState, data: &[u8]) -> Result<()> {
    if session.role() != Role::Client {
        return Err(Error::Internal("client_recv on a server".to_string()));
    }
    let mut r = Reader::new(data);
    let selected = r.read_u16()?;
    r.finish("pre_shared_key")?;

    let psk = match session.psk_state() {
        PskState::Offered(psk) if psk.index() == selected => psk.clone(),
        PskState::Offered(_) => {
            return Err(Error::IllegalParameter(format!(
                "server selected PSK {} which was not offered",
                selected
            )))
        }
        PskState::ModesSent(_) => {
            return Err(Error::IllegalParameter(
                "server selected a PSK but none was offered".to_string(),
            ))
        }
        _ => {
            return Err(Error::UnexpectedExtension(
                "pre_shared_key without psk_key_exchange_modes".to_string(),
            ))
        }
    };

    if psk.source() == PskSource::Resumption {
        session.set_resumption_requested();
    }
    session.set_psk_state(PskState::Selected(psk));
    Ok(())
}
