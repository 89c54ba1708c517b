//! Per-handshake security state.
//!
//! [`SecurityState`] holds the fields this crate reads and writes on behalf
//! of the enclosing connection: role, version, randoms, transcript, PSK
//! negotiation and legacy signing state. One state belongs to one handshake
//! and is never shared between threads while the handshake runs.

use std::fmt;

use hsauth_crypto::{HashAlgorithm, SignatureAlgorithm};
use zeroize::Zeroizing;

use crate::extensions::psk_key_exchange_modes::PskKeyExchangeMode;
use crate::protocol::{ProtocolVersion, Role};
use crate::transcript::HandshakeTranscript;
use crate::Config;

/// Where a PSK came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PskSource {
    /// Configured out of band (username and key).
    External,
    /// Derived from a session ticket.
    Resumption,
}

/// A PSK chosen for this handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct NegotiatedPsk {
    key: Zeroizing<Vec<u8>>,
    prf: HashAlgorithm,
    source: PskSource,
    index: u16,
}

impl NegotiatedPsk {
    pub(crate) fn new(
        key: Zeroizing<Vec<u8>>,
        prf: HashAlgorithm,
        source: PskSource,
        index: u16,
    ) -> Self {
        Self {
            key,
            prf,
            source,
            index,
        }
    }

    /// The PSK bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// PRF the PSK was bound with.
    pub fn prf(&self) -> HashAlgorithm {
        self.prf
    }

    /// Origin of the PSK.
    pub fn source(&self) -> PskSource {
        self.source
    }

    /// Position of the identity in the offered list.
    pub fn index(&self) -> u16 {
        self.index
    }
}

impl fmt::Debug for NegotiatedPsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiatedPsk")
            .field("key", &"<redacted>")
            .field("prf", &self.prf)
            .field("source", &self.source)
            .field("index", &self.index)
            .finish()
    }
}

/// Progress of PSK negotiation within one handshake.
///
/// ```text
/// client: Inactive -> ModesSent -> Offered -> Selected
/// server: Inactive -> ModesReceived -> Selected
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PskState {
    /// No psk_key_exchange_modes exchanged; PSKs are off.
    #[default]
    Inactive,
    /// Client advertised the listed modes.
    ModesSent(Vec<PskKeyExchangeMode>),
    /// Client offered a PSK with a binder; the server has not answered.
    Offered(NegotiatedPsk),
    /// Server received the client's modes.
    ModesReceived(Vec<PskKeyExchangeMode>),
    /// Both sides agreed on a PSK.
    Selected(NegotiatedPsk),
}

/// Receives audit messages, such as tolerated key-usage violations.
pub type AuditHook = Box<dyn Fn(&str) + Send + Sync>;

/// Security parameters of one handshake.
pub struct SecurityState {
    role: Role,
    config: Config,
    /// Negotiated (or, before ServerHello, proposed) protocol version.
    pub version: ProtocolVersion,
    /// ClientHello.random
    pub client_random: [u8; 32],
    /// ServerHello.random
    pub server_random: [u8; 32],
    /// Handshake messages so far.
    pub transcript: HandshakeTranscript,
    /// PRF hash of the negotiated cipher suite (TLS 1.2 and 1.3).
    pub prf: HashAlgorithm,
    /// Premaster secret from the key exchange.
    pub premaster_secret: Zeroizing<Vec<u8>>,
    /// Master secret, empty until generated.
    pub master_secret: Zeroizing<Vec<u8>>,
    /// Signature algorithm of the ServerKeyExchange.
    pub server_sign_algo: Option<SignatureAlgorithm>,
    /// Signature algorithm of the client's CertificateVerify.
    pub client_sign_algo: Option<SignatureAlgorithm>,
    /// signature_algorithms advertised by the peer, in its preference order.
    pub peer_signature_algorithms: Vec<SignatureAlgorithm>,
    psk: PskState,
    resumption_requested: bool,
    master_secret_generation: u32,
    audit_hook: Option<AuditHook>,
}

impl SecurityState {
    /// Fresh state for one handshake.
    pub fn new(role: Role, version: ProtocolVersion, config: Config) -> Self {
        Self {
            role,
            config,
            version,
            client_random: [0; 32],
            server_random: [0; 32],
            transcript: HandshakeTranscript::new(),
            prf: HashAlgorithm::Sha256,
            premaster_secret: Zeroizing::new(Vec::new()),
            master_secret: Zeroizing::new(Vec::new()),
            server_sign_algo: None,
            client_sign_algo: None,
            peer_signature_algorithms: Vec::new(),
            psk: PskState::Inactive,
            resumption_requested: false,
            master_secret_generation: 0,
            audit_hook: None,
        }
    }

    /// Client or server.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Policy in force for this handshake.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current PSK negotiation state.
    pub fn psk_state(&self) -> &PskState {
        &self.psk
    }

    pub(crate) fn set_psk_state(&mut self, state: PskState) {
        self.psk = state;
    }

    /// The PSK offered or selected, if any.
    pub fn negotiated_psk(&self) -> Option<&NegotiatedPsk> {
        match &self.psk {
            PskState::Offered(psk) | PskState::Selected(psk) => Some(psk),
            _ => None,
        }
    }

    /// Whether both sides agreed on a PSK.
    pub fn psk_selected(&self) -> bool {
        matches!(self.psk, PskState::Selected(_))
    }

    /// Index of the accepted identity.
    pub fn psk_selected_index(&self) -> Option<u16> {
        match &self.psk {
            PskState::Selected(psk) => Some(psk.index()),
            _ => None,
        }
    }

    /// Whether a session ticket was accepted for resumption.
    pub fn resumption_requested(&self) -> bool {
        self.resumption_requested
    }

    pub(crate) fn set_resumption_requested(&mut self) {
        self.resumption_requested = true;
    }

    /// How many times the master secret has been generated.
    pub fn master_secret_generation(&self) -> u32 {
        self.master_secret_generation
    }

    pub(crate) fn bump_master_secret_generation(&mut self) {
        self.master_secret_generation += 1;
    }

    /// Install a receiver for audit messages.
    pub fn set_audit_hook(&mut self, hook: AuditHook) {
        self.audit_hook = Some(hook);
    }

    pub(crate) fn audit(&self, message: &str) {
        tracing::warn!(target: "hsauth::audit", "{}", message);
        if let Some(hook) = &self.audit_hook {
            hook(message);
        }
    }
}

impl fmt::Debug for SecurityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityState")
            .field("role", &self.role)
            .field("version", &self.version)
            .field("transcript_len", &self.transcript.len())
            .field("prf", &self.prf)
            .field("psk", &self.psk)
            .field("resumption_requested", &self.resumption_requested)
            .field("master_secret_generation", &self.master_secret_generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fresh_state() {
        let state = SecurityState::new(Role::Server, ProtocolVersion::Tls13, Config::default());
        assert_eq!(state.role(), Role::Server);
        assert_eq!(state.psk_state(), &PskState::Inactive);
        assert!(state.negotiated_psk().is_none());
        assert!(!state.resumption_requested());
        assert_eq!(state.psk_selected_index(), None);
    }

    #[test]
    fn test_offered_psk_is_negotiated_but_not_selected() {
        let mut state = SecurityState::new(Role::Client, ProtocolVersion::Tls13, Config::default());
        let psk = NegotiatedPsk::new(
            Zeroizing::new(vec![1; 32]),
            HashAlgorithm::Sha256,
            PskSource::External,
            0,
        );
        state.set_psk_state(PskState::Offered(psk.clone()));
        assert_eq!(state.negotiated_psk(), Some(&psk));
        assert!(!state.psk_selected());

        state.set_psk_state(PskState::Selected(psk));
        assert!(state.psk_selected());
        assert_eq!(state.psk_selected_index(), Some(0));
    }

    #[test]
    fn test_audit_hook_receives_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut state = SecurityState::new(Role::Client, ProtocolVersion::Tls12, Config::default());
        state.set_audit_hook(Box::new(move |m| sink.lock().unwrap().push(m.to_string())));
        state.audit("hello");
        assert_eq!(seen.lock().unwrap().as_slice(), ["hello".to_string()]);
    }

    #[test]
    fn test_debug_redacts_psk() {
        let psk = NegotiatedPsk::new(
            Zeroizing::new(vec![0xab; 4]),
            HashAlgorithm::Sha256,
            PskSource::Resumption,
            1,
        );
        let rendered = format!("{:?}", psk);
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains("171"));
    }
}
