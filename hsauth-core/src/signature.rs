//! Handshake signatures.
//!
//! Two things get signed during a certificate-authenticated handshake:
//!
//! - ServerKeyExchange parameters of (EC)DHE suites, as
//!   `client_random || server_random || params`
//!   ([`sign_handshake_data`] / [`verify_handshake_data`]);
//! - the transcript, in CertificateVerify
//!   ([`sign_cert_verify`] / [`verify_cert_verify`]).
//!
//! How the bytes are assembled depends only on the protocol version, so the
//! version is mapped once to a [`SigStrategy`] and each operation matches on
//! it:
//!
//! ```text
//! Ssl3   MD5 and SHA-1 SSL 3.0 MACs keyed with the master secret (RSA: both,
//!        36 bytes; other keys: SHA-1 only), signed raw
//! Tls10  MD5+SHA-1 digest (RSA) or SHA-1 digest, signed raw
//! Tls12  negotiated SignatureScheme over the bytes themselves
//! Tls13  SignatureScheme over 0x20*64 || context || 0x00 || Hash(transcript)
//! ```
//!
//! Before any key is used the certificate's key usage is checked; see
//! [`check_key_usage_for_sig`].

use std::fmt;

use hsauth_crypto::{
    CryptoProvider, HashAlgorithm, PublicKeyAlgorithm, SignatureAlgorithm, SigningKey,
    VerifyingKey,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::prf::{generate_master_secret, ssl3_handshake_mac};
use crate::protocol::{ProtocolVersion, Role};
use crate::session::SecurityState;
use crate::transcript::digest;

/// Context string for server CertificateVerify signatures.
pub const SERVER_CONTEXT: &[u8] = b"TLS 1.3, server CertificateVerify";

/// Context string for client CertificateVerify signatures.
pub const CLIENT_CONTEXT: &[u8] = b"TLS 1.3, client CertificateVerify";

/// Padding for signature messages (64 spaces).
const SIGNATURE_PADDING: [u8; 64] = [0x20; 64];

/// X.509 keyUsage bits of a certificate.
///
/// Zero means the certificate carries no keyUsage extension, which places no
/// restriction on the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyUsage(u16);

impl KeyUsage {
    /// digitalSignature
    pub const DIGITAL_SIGNATURE: u16 = 0x0080;
    /// keyEncipherment
    pub const KEY_ENCIPHERMENT: u16 = 0x0020;
    /// keyAgreement
    pub const KEY_AGREEMENT: u16 = 0x0008;

    /// Usage from raw bits.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// No keyUsage extension.
    pub const fn unrestricted() -> Self {
        Self(0)
    }

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether the key may produce handshake signatures.
    pub const fn allows_signing(self) -> bool {
        self.0 == 0 || self.0 & Self::DIGITAL_SIGNATURE != 0
    }
}

/// Public half of a certificate key, as the handshake needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateKey {
    algorithm: PublicKeyAlgorithm,
    public_key: VerifyingKey,
    key_usage: KeyUsage,
}

impl CertificateKey {
    /// Key taken from a parsed certificate.
    pub fn new(algorithm: PublicKeyAlgorithm, public_key: VerifyingKey, key_usage: KeyUsage) -> Self {
        Self {
            algorithm,
            public_key,
            key_usage,
        }
    }

    /// Public-key algorithm.
    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    /// Encoded public key.
    pub fn public_key(&self) -> &[u8] {
        self.public_key.as_bytes()
    }

    /// keyUsage of the certificate.
    pub fn key_usage(&self) -> KeyUsage {
        self.key_usage
    }
}

/// Private key matching the local certificate.
#[derive(Clone)]
pub struct PrivateKey {
    algorithm: PublicKeyAlgorithm,
    key: SigningKey,
}

impl PrivateKey {
    /// Wrap an encoded private key.
    pub fn new(algorithm: PublicKeyAlgorithm, key: SigningKey) -> Self {
        Self { algorithm, key }
    }

    /// Public-key algorithm.
    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    fn bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Whose certificate a key-usage check is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateOwner {
    /// Our own certificate, about to sign.
    Local,
    /// The peer's certificate, about to verify.
    Peer,
}

impl CertificateOwner {
    fn label(self) -> &'static str {
        match self {
            CertificateOwner::Local => "Local",
            CertificateOwner::Peer => "Peer's",
        }
    }
}

/// Signature construction selected by protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigStrategy {
    /// SSL 3.0
    Ssl3,
    /// TLS 1.0, TLS 1.1 and DTLS 1.0
    Tls10,
    /// TLS 1.2 and DTLS 1.2
    Tls12,
    /// TLS 1.3 and DTLS 1.3
    Tls13,
}

impl SigStrategy {
    /// Strategy for a negotiated version.
    pub const fn for_version(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::Ssl30 => SigStrategy::Ssl3,
            ProtocolVersion::Tls10 | ProtocolVersion::Tls11 | ProtocolVersion::Dtls10 => {
                SigStrategy::Tls10
            }
            ProtocolVersion::Tls12 | ProtocolVersion::Dtls12 => SigStrategy::Tls12,
            ProtocolVersion::Tls13 | ProtocolVersion::Dtls13 => SigStrategy::Tls13,
        }
    }

    /// Whether the signature algorithm is negotiated and carried on the wire.
    pub const fn has_selectable_sighash(self) -> bool {
        matches!(self, SigStrategy::Tls12 | SigStrategy::Tls13)
    }
}

/// A CertificateVerify signature and the scheme that produced it.
///
/// `algorithm` is `None` for SSL 3.0 through TLS 1.1, where no scheme is
/// sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertVerifySignature {
    /// Scheme to put on the wire.
    pub algorithm: Option<SignatureAlgorithm>,
    /// Signature bytes.
    pub signature: Vec<u8>,
}

/// Refuse a certificate whose keyUsage excludes digitalSignature.
///
/// The configuration may tolerate the violation (separately for the local and
/// the peer certificate). Either way an audit record is written.
///
/// # Errors
///
/// [`Error::KeyUsageViolation`] when the violation is not tolerated.
pub fn check_key_usage_for_sig(
    session: &SecurityState,
    key_usage: KeyUsage,
    owner: CertificateOwner,
) -> Result<()> {
    if key_usage.allows_signing() {
        return Ok(());
    }

    let allowed = match owner {
        CertificateOwner::Local => session.config().allow_server_key_usage_violation,
        CertificateOwner::Peer => session.config().allow_key_usage_violation,
    };
    if allowed {
        session.audit(&format!(
            "{} certificate does not allow digital signatures. Key usage violation detected (ignored).",
            owner.label()
        ));
        Ok(())
    } else {
        session.audit(&format!(
            "{} certificate does not allow digital signatures. Key usage violation detected.",
            owner.label()
        ));
        Err(Error::KeyUsageViolation)
    }
}

/// `client_random || server_random || params`
fn randoms_and_params(session: &SecurityState, params: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(64 + params.len());
    data.extend_from_slice(&session.client_random);
    data.extend_from_slice(&session.server_random);
    data.extend_from_slice(params);
    data
}

/// Digest signed by SSL 3.0 - TLS 1.1 for a key of this type.
fn legacy_hash(algorithm: PublicKeyAlgorithm) -> Result<HashAlgorithm> {
    match algorithm {
        PublicKeyAlgorithm::Rsa => Ok(HashAlgorithm::Md5Sha1),
        pk if pk.signs_digests() => Ok(HashAlgorithm::Sha1),
        _ => Err(Error::UnknownPkAlgorithm),
    }
}

/// SSL 3.0 CertificateVerify input: the MD5 MAC (RSA only) followed by the
/// SHA-1 MAC of the handshake messages.
fn ssl3_cert_verify_input(
    provider: &dyn CryptoProvider,
    algorithm: PublicKeyAlgorithm,
    messages: &[u8],
    master_secret: &[u8],
) -> Result<Vec<u8>> {
    if !algorithm.signs_digests() {
        return Err(Error::UnknownPkAlgorithm);
    }
    let mut input = Vec::with_capacity(HashAlgorithm::Md5Sha1.output_size());
    if algorithm == PublicKeyAlgorithm::Rsa {
        input.extend_from_slice(&ssl3_handshake_mac(
            provider,
            HashAlgorithm::Md5,
            messages,
            master_secret,
        )?);
    }
    input.extend_from_slice(&ssl3_handshake_mac(
        provider,
        HashAlgorithm::Sha1,
        messages,
        master_secret,
    )?);
    Ok(input)
}

/// Build the TLS 1.3 CertificateVerify content.
///
/// ```text
/// 0x20 * 64 || context || 0x00 || transcript_hash
/// ```
///
/// The server context is used when `signer` is [`Role::Server`].
pub fn build_signature_message(transcript_hash: &[u8], signer: Role) -> Vec<u8> {
    let context = match signer {
        Role::Server => SERVER_CONTEXT,
        Role::Client => CLIENT_CONTEXT,
    };

    let mut message = Vec::with_capacity(64 + context.len() + 1 + transcript_hash.len());
    message.extend_from_slice(&SIGNATURE_PADDING);
    message.extend_from_slice(context);
    message.push(0x00);
    message.extend_from_slice(transcript_hash);
    message
}

fn scheme_is_compatible(algorithm: SignatureAlgorithm, key: PublicKeyAlgorithm, strategy: SigStrategy) -> bool {
    let allowed = match strategy {
        SigStrategy::Tls13 => algorithm.allowed_in_tls13(),
        _ => algorithm.allowed_in_tls12(),
    };
    allowed && algorithm.public_key_algorithm() == key
}

/// Pick the first scheme the peer advertised that we enable and our key can
/// produce.
fn select_scheme(
    session: &SecurityState,
    key: PublicKeyAlgorithm,
    strategy: SigStrategy,
) -> Result<SignatureAlgorithm> {
    let enabled = &session.config().signature_algorithms;
    session
        .peer_signature_algorithms
        .iter()
        .copied()
        .find(|alg| enabled.contains(alg) && scheme_is_compatible(*alg, key, strategy))
        .ok_or_else(|| {
            Error::UnwantedAlgorithm(format!(
                "no common signature scheme for a {} key",
                key.name()
            ))
        })
}

/// Check a peer-chosen scheme against the certificate and local policy.
fn check_peer_scheme(
    session: &SecurityState,
    algorithm: SignatureAlgorithm,
    cert: &CertificateKey,
    strategy: SigStrategy,
) -> Result<()> {
    if !scheme_is_compatible(algorithm, cert.algorithm(), strategy) {
        return Err(Error::IncompatibleSignatureKey(format!(
            "{} with a {} key",
            algorithm.name(),
            cert.algorithm().name()
        )));
    }
    if !session.config().signature_algorithms.contains(&algorithm) {
        return Err(Error::UnwantedAlgorithm(algorithm.name().to_string()));
    }
    Ok(())
}

fn record_scheme(session: &mut SecurityState, signer: Role, algorithm: Option<SignatureAlgorithm>) {
    match signer {
        Role::Server => session.server_sign_algo = algorithm,
        Role::Client => session.client_sign_algo = algorithm,
    }
}

fn peer_of(role: Role) -> Role {
    match role {
        Role::Client => Role::Server,
        Role::Server => Role::Client,
    }
}

/// Sign ServerKeyExchange parameters with the local key.
///
/// The scheme is the one already chosen in `session.server_sign_algo`. Under
/// TLS 1.2 it signs `client_random || server_random || params` directly;
/// before TLS 1.2 that input is hashed (MD5+SHA-1 for RSA, otherwise the
/// scheme's hash) and the digest is signed raw.
///
/// # Errors
///
/// - [`Error::UnwantedAlgorithm`] when no scheme was chosen
/// - [`Error::KeyUsageViolation`] from the key-usage check
/// - [`Error::UnknownHashAlgorithm`] / [`Error::UnknownPkAlgorithm`] when a
///   legacy digest cannot be formed
/// - [`Error::Internal`] under TLS 1.3, which has no ServerKeyExchange
pub fn sign_handshake_data(
    session: &SecurityState,
    provider: &dyn CryptoProvider,
    cert: &CertificateKey,
    key: &PrivateKey,
    params: &[u8],
) -> Result<Vec<u8>> {
    let algorithm = session
        .server_sign_algo
        .ok_or_else(|| Error::UnwantedAlgorithm("no ServerKeyExchange scheme".to_string()))?;

    check_key_usage_for_sig(session, cert.key_usage(), CertificateOwner::Local)?;

    let strategy = SigStrategy::for_version(session.version);
    debug!(?strategy, scheme = algorithm.name(), "signing handshake data");

    match strategy {
        SigStrategy::Tls13 => Err(Error::Internal(
            "TLS 1.3 has no ServerKeyExchange".to_string(),
        )),
        SigStrategy::Tls12 => {
            if algorithm.public_key_algorithm() != key.algorithm() {
                return Err(Error::IncompatibleSignatureKey(format!(
                    "{} with a {} key",
                    algorithm.name(),
                    key.algorithm().name()
                )));
            }
            let data = randoms_and_params(session, params);
            Ok(provider.signature(algorithm)?.sign(key.bytes(), &data)?)
        }
        SigStrategy::Ssl3 | SigStrategy::Tls10 => {
            let hash = if key.algorithm() == PublicKeyAlgorithm::Rsa {
                HashAlgorithm::Md5Sha1
            } else {
                algorithm.hash_algorithm().ok_or(Error::UnknownHashAlgorithm)?
            };
            let pk = algorithm.public_key_algorithm();
            if !pk.signs_digests() {
                return Err(Error::UnknownPkAlgorithm);
            }
            let data = randoms_and_params(session, params);
            let hashed = digest(provider, hash, &data)?;
            Ok(provider.raw_signature(pk)?.sign_digest(key.bytes(), &hashed)?)
        }
    }
}

/// Verify the peer's signature over ServerKeyExchange parameters.
///
/// `algorithm` is the scheme read from the message (TLS 1.2) or `None`
/// before TLS 1.2. Once the scheme passes the policy checks it is recorded
/// as `session.server_sign_algo`.
///
/// # Errors
///
/// - [`Error::CertificateRequired`] without a peer certificate
/// - [`Error::KeyUsageViolation`] from the key-usage check
/// - [`Error::IncompatibleSignatureKey`] / [`Error::UnwantedAlgorithm`] for a
///   scheme that does not fit the key or is not enabled
/// - [`Error::SignatureVerificationFailed`] for a bad signature
pub fn verify_handshake_data(
    session: &mut SecurityState,
    provider: &dyn CryptoProvider,
    cert: Option<&CertificateKey>,
    params: &[u8],
    signature: &[u8],
    algorithm: Option<SignatureAlgorithm>,
) -> Result<()> {
    let cert = cert.ok_or_else(|| Error::CertificateRequired("ServerKeyExchange".to_string()))?;
    check_key_usage_for_sig(session, cert.key_usage(), CertificateOwner::Peer)?;

    let strategy = SigStrategy::for_version(session.version);
    debug!(?strategy, ?algorithm, "verifying handshake data");

    match strategy {
        SigStrategy::Tls13 => Err(Error::Internal(
            "TLS 1.3 has no ServerKeyExchange".to_string(),
        )),
        SigStrategy::Tls12 => {
            let algorithm = algorithm
                .ok_or_else(|| Error::UnwantedAlgorithm("missing signature scheme".to_string()))?;
            check_peer_scheme(session, algorithm, cert, strategy)?;
            session.server_sign_algo = Some(algorithm);
            let data = randoms_and_params(session, params);
            provider
                .signature(algorithm)?
                .verify(cert.public_key(), &data, signature)?;
            Ok(())
        }
        SigStrategy::Ssl3 | SigStrategy::Tls10 => {
            let hash = legacy_hash(cert.algorithm())?;
            session.server_sign_algo = algorithm;
            let data = randoms_and_params(session, params);
            let hashed = digest(provider, hash, &data)?;
            provider
                .raw_signature(cert.algorithm())?
                .verify_digest(cert.public_key(), &hashed, signature)?;
            Ok(())
        }
    }
}

/// Sign the transcript for CertificateVerify.
///
/// The whole transcript so far is signed; the CertificateVerify message is
/// appended by the caller afterwards. Under SSL 3.0 the master secret is
/// generated again first, since the MACs are keyed with it.
///
/// # Errors
///
/// - [`Error::KeyUsageViolation`] from the key-usage check
/// - [`Error::UnwantedAlgorithm`] when no advertised scheme fits (TLS 1.2+)
/// - [`Error::IncompatibleSignatureKey`] when the key does not match the
///   certificate (before TLS 1.2)
/// - [`Error::UnknownPkAlgorithm`] for keys that cannot sign a digest
///   (before TLS 1.2)
pub fn sign_cert_verify(
    session: &mut SecurityState,
    provider: &dyn CryptoProvider,
    cert: &CertificateKey,
    key: &PrivateKey,
) -> Result<CertVerifySignature> {
    check_key_usage_for_sig(session, cert.key_usage(), CertificateOwner::Local)?;

    let strategy = SigStrategy::for_version(session.version);
    let signer = session.role();

    if strategy.has_selectable_sighash() {
        let algorithm = select_scheme(session, key.algorithm(), strategy)?;
        record_scheme(session, signer, Some(algorithm));
        debug!(?strategy, scheme = algorithm.name(), "signing CertificateVerify");

        let signature = match strategy {
            SigStrategy::Tls13 => {
                let hash = digest(provider, session.prf, session.transcript.full())?;
                let message = build_signature_message(&hash, signer);
                provider.signature(algorithm)?.sign(key.bytes(), &message)?
            }
            _ => provider
                .signature(algorithm)?
                .sign(key.bytes(), session.transcript.full())?,
        };
        return Ok(CertVerifySignature {
            algorithm: Some(algorithm),
            signature,
        });
    }

    if cert.algorithm() != key.algorithm() {
        return Err(Error::IncompatibleSignatureKey(format!(
            "{} certificate with a {} key",
            cert.algorithm().name(),
            key.algorithm().name()
        )));
    }
    debug!(?strategy, key = key.algorithm().name(), "signing CertificateVerify");

    let input = match strategy {
        SigStrategy::Ssl3 => {
            generate_master_secret(session, provider)?;
            ssl3_cert_verify_input(
                provider,
                key.algorithm(),
                session.transcript.full(),
                &session.master_secret,
            )?
        }
        _ => {
            let hash = legacy_hash(key.algorithm())?;
            digest(provider, hash, session.transcript.full())?
        }
    };
    let signature = provider
        .raw_signature(key.algorithm())?
        .sign_digest(key.bytes(), &input)?;
    record_scheme(session, signer, None);
    Ok(CertVerifySignature {
        algorithm: None,
        signature,
    })
}

/// Verify the peer's CertificateVerify.
///
/// The CertificateVerify message must already be in the transcript; the
/// signature covers everything before it.
///
/// # Errors
///
/// - [`Error::CertificateRequired`] without a peer certificate
/// - [`Error::KeyUsageViolation`] from the key-usage check
/// - [`Error::IncompatibleSignatureKey`] / [`Error::UnwantedAlgorithm`] for a
///   scheme that does not fit the key or is not enabled (TLS 1.2+)
/// - [`Error::SignatureVerificationFailed`] for a bad signature
pub fn verify_cert_verify(
    session: &mut SecurityState,
    provider: &dyn CryptoProvider,
    cert: Option<&CertificateKey>,
    signature: &[u8],
    algorithm: Option<SignatureAlgorithm>,
) -> Result<()> {
    let cert = cert.ok_or_else(|| Error::CertificateRequired("CertificateVerify".to_string()))?;
    check_key_usage_for_sig(session, cert.key_usage(), CertificateOwner::Peer)?;

    let strategy = SigStrategy::for_version(session.version);
    let signer = peer_of(session.role());
    debug!(?strategy, ?algorithm, "verifying CertificateVerify");

    match strategy {
        SigStrategy::Tls12 | SigStrategy::Tls13 => {
            let algorithm = algorithm
                .ok_or_else(|| Error::UnwantedAlgorithm("missing signature scheme".to_string()))?;
            check_peer_scheme(session, algorithm, cert, strategy)?;
            record_scheme(session, signer, Some(algorithm));
            let verifier = provider.signature(algorithm)?;
            if strategy == SigStrategy::Tls13 {
                let hash = digest(provider, session.prf, session.transcript.up_to_previous())?;
                let message = build_signature_message(&hash, signer);
                verifier.verify(cert.public_key(), &message, signature)?;
            } else {
                verifier.verify(cert.public_key(), session.transcript.up_to_previous(), signature)?;
            }
            Ok(())
        }
        SigStrategy::Ssl3 => {
            record_scheme(session, signer, algorithm);
            generate_master_secret(session, provider)?;
            let input = ssl3_cert_verify_input(
                provider,
                cert.algorithm(),
                session.transcript.up_to_previous(),
                &session.master_secret,
            )?;
            provider
                .raw_signature(cert.algorithm())?
                .verify_digest(cert.public_key(), &input, signature)?;
            Ok(())
        }
        SigStrategy::Tls10 => {
            let hash = legacy_hash(cert.algorithm())?;
            record_scheme(session, signer, algorithm);
            let hashed = digest(provider, hash, session.transcript.up_to_previous())?;
            provider
                .raw_signature(cert.algorithm())?
                .verify_digest(cert.public_key(), &hashed, signature)?;
            Ok(())
        }
    }
}
