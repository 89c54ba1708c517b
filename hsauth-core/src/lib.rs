//! # hsauth Core
//!
//! Handshake authentication pieces of a TLS stack: TLS 1.3 pre-shared keys
//! and session-ticket resumption, and the version-dispatching signature
//! engine used by ServerKeyExchange and CertificateVerify.
//!
//! This crate provides:
//! - PSK binders computed over a ClientHello that is still being written
//! - the `pre_shared_key` and `psk_key_exchange_modes` extensions
//! - session tickets: client state, packing, server-side sealing and rotation
//! - SSL 3.0, TLS 1.0-1.1, TLS 1.2 and TLS 1.3 handshake signatures
//! - legacy master-secret generation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   handshake state machine (caller)      │
//! └─────────────────┬───────────────────────┘
//!                   │ SecurityState, HandshakeBuffer
//! ┌─────────────────▼───────────────────────┐
//! │       hsauth-core (this crate)          │
//! │  ┌──────────────────────────────────┐   │
//! │  │   extensions (41, 45)            │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   psk: binder, tickets, creds    │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   secrets / prf                  │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   signature                      │   │
//! │  └──────────────────────────────────┘   │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │      hsauth-crypto (trait interface)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! All operations are synchronous and act on one handshake's
//! [`SecurityState`]; nothing here performs I/O.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use hsauth_crypto;

pub mod codec;
pub mod error;
pub mod extensions;
pub mod messages;
pub mod prf;
pub mod protocol;
pub mod psk;
pub mod secrets;
pub mod session;
pub mod signature;
pub mod transcript;

pub use error::{AlertDescription, Error, ExtensionOutcome, Result};
pub use extensions::PskKeyExchangeMode;
pub use protocol::{ProtocolVersion, Role};
pub use session::{PskState, SecurityState};

use hsauth_crypto::SignatureAlgorithm;

/// Longest ticket lifetime a server may advertise (RFC 8446, 4.6.1).
pub const MAX_TICKET_LIFETIME: u32 = 604_800;

/// Reject ticket lifetimes outside `1..=MAX_TICKET_LIFETIME`.
pub(crate) fn check_ticket_lifetime(seconds: u32) -> Result<u32> {
    if seconds == 0 || seconds > MAX_TICKET_LIFETIME {
        return Err(Error::InvalidConfig(format!(
            "Ticket lifetime {} outside 1..={}",
            seconds, MAX_TICKET_LIFETIME
        )));
    }
    Ok(seconds)
}

/// Handshake authentication policy.
///
/// # Example
///
/// ```rust
/// use hsauth_core::{Config, PskKeyExchangeMode};
///
/// let config = Config::builder()
///     .with_ticket_lifetime(3600)
///     .with_psk_key_exchange_modes(&[PskKeyExchangeMode::PskDheKe])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Sign with our own certificate even if its keyUsage forbids it.
    pub allow_server_key_usage_violation: bool,

    /// Accept peer signatures from certificates whose keyUsage forbids it.
    pub allow_key_usage_violation: bool,

    /// Enabled signature schemes, most preferred first.
    pub signature_algorithms: Vec<SignatureAlgorithm>,

    /// Lifetime of issued session tickets, in seconds (default: 7200)
    pub ticket_lifetime: u32,

    /// PSK key exchange modes offered or accepted.
    pub psk_key_exchange_modes: Vec<PskKeyExchangeMode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_server_key_usage_violation: false,
            allow_key_usage_violation: false,
            signature_algorithms: vec![
                SignatureAlgorithm::Ed25519,
                SignatureAlgorithm::EcdsaSecp256r1Sha256,
                SignatureAlgorithm::EcdsaSecp384r1Sha384,
                SignatureAlgorithm::EcdsaSecp521r1Sha512,
                SignatureAlgorithm::RsaPssRsaeSha256,
                SignatureAlgorithm::RsaPssRsaeSha384,
                SignatureAlgorithm::RsaPssRsaeSha512,
                SignatureAlgorithm::RsaPkcs1Sha256,
                SignatureAlgorithm::RsaPkcs1Sha384,
                SignatureAlgorithm::RsaPkcs1Sha512,
                SignatureAlgorithm::DsaSha256,
                SignatureAlgorithm::EcdsaSha1,
                SignatureAlgorithm::RsaPkcs1Sha1,
                SignatureAlgorithm::DsaSha1,
            ],
            ticket_lifetime: 7200,
            psk_key_exchange_modes: vec![PskKeyExchangeMode::PskDheKe],
        }
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Configuration builder.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Tolerate a local certificate without digitalSignature.
    pub fn with_allow_server_key_usage_violation(mut self, allow: bool) -> Self {
        self.config.allow_server_key_usage_violation = allow;
        self
    }

    /// Tolerate a peer certificate without digitalSignature.
    pub fn with_allow_key_usage_violation(mut self, allow: bool) -> Self {
        self.config.allow_key_usage_violation = allow;
        self
    }

    /// Set the enabled signature schemes.
    pub fn with_signature_algorithms(mut self, algorithms: &[SignatureAlgorithm]) -> Self {
        self.config.signature_algorithms = algorithms.to_vec();
        self
    }

    /// Set the session ticket lifetime in seconds.
    pub fn with_ticket_lifetime(mut self, seconds: u32) -> Self {
        self.config.ticket_lifetime = seconds;
        self
    }

    /// Set the PSK key exchange modes.
    pub fn with_psk_key_exchange_modes(mut self, modes: &[PskKeyExchangeMode]) -> Self {
        self.config.psk_key_exchange_modes = modes.to_vec();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config> {
        if self.config.signature_algorithms.is_empty() {
            return Err(Error::InvalidConfig(
                "No signature algorithms specified".into(),
            ));
        }

        check_ticket_lifetime(self.config.ticket_lifetime)?;

        if self.config.psk_key_exchange_modes.is_empty() {
            return Err(Error::InvalidConfig(
                "No PSK key exchange modes specified".into(),
            ));
        }

        Ok(self.config)
    }
}
