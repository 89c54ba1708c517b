//! Shared fixtures for integration tests.
//!
//! The RustCrypto backend has no RSA or DSA, so [`RecordingProvider`] adds
//! both: signatures are HMAC-SHA256 tags under the key bytes (signing and
//! verifying keys are the same bytes), and every input handed to a signer is
//! recorded so tests can check exactly what the engine signed.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hsauth_core::codec::HandshakeBuffer;
use hsauth_core::extensions::{pre_shared_key, psk_key_exchange_modes};
use hsauth_core::hsauth_crypto::{
    Aead, AeadAlgorithm, CryptoProvider, Error as CryptoError, Hash, HashAlgorithm, Hmac, Kdf,
    KdfAlgorithm, PublicKeyAlgorithm, Random, RawSignature, Result as CryptoResult, Signature,
    SignatureAlgorithm,
};
use hsauth_core::messages::ClientHelloWriter;
use hsauth_core::protocol::{ExtensionType, ProtocolVersion, Role};
use hsauth_core::psk::{ClientPskCredentials, ClientTicket};
use hsauth_core::{Config, SecurityState};
use hsauth_crypto_rustcrypto::hmac::create_hmac;
use hsauth_crypto_rustcrypto::RustCryptoProvider;
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness; `RUST_LOG=hsauth_core=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What a signer was asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signed {
    /// A precomputed digest, for a public-key algorithm.
    Digest(PublicKeyAlgorithm, Vec<u8>),
    /// A whole message, for a signature scheme.
    Message(SignatureAlgorithm, Vec<u8>),
}

type Log = Arc<Mutex<Vec<Signed>>>;

fn mock_tag(key: &[u8], input: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut mac = create_hmac(HashAlgorithm::Sha256, key)?;
    mac.update(input);
    Ok(mac.finalize())
}

fn mock_check(key: &[u8], input: &[u8], signature: &[u8]) -> CryptoResult<()> {
    if mock_tag(key, input)? == signature {
        Ok(())
    } else {
        Err(CryptoError::SignatureVerificationFailed)
    }
}

struct RecordingRaw {
    algorithm: PublicKeyAlgorithm,
    log: Log,
}

impl RawSignature for RecordingRaw {
    fn sign_digest(&self, signing_key: &[u8], digest: &[u8]) -> CryptoResult<Vec<u8>> {
        self.log
            .lock()
            .unwrap()
            .push(Signed::Digest(self.algorithm, digest.to_vec()));
        mock_tag(signing_key, digest)
    }

    fn verify_digest(&self, verifying_key: &[u8], digest: &[u8], signature: &[u8]) -> CryptoResult<()> {
        mock_check(verifying_key, digest, signature)
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }
}

struct RecordingSignature {
    algorithm: SignatureAlgorithm,
    log: Log,
}

impl Signature for RecordingSignature {
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>> {
        self.log
            .lock()
            .unwrap()
            .push(Signed::Message(self.algorithm, message.to_vec()));
        mock_tag(signing_key, message)
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        mock_check(verifying_key, message, signature)
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }
}

/// RustCrypto provider plus recording RSA and DSA signers.
#[derive(Debug)]
pub struct RecordingProvider {
    inner: RustCryptoProvider,
    log: Log,
}

impl RecordingProvider {
    /// Everything signed so far, oldest first.
    pub fn signed(&self) -> Vec<Signed> {
        self.log.lock().unwrap().clone()
    }
}

fn mocked(algorithm: PublicKeyAlgorithm) -> bool {
    matches!(algorithm, PublicKeyAlgorithm::Rsa | PublicKeyAlgorithm::Dsa)
}

impl CryptoProvider for RecordingProvider {
    fn new() -> Self {
        init_tracing();
        Self {
            inner: RustCryptoProvider::new(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn hash(&self, algorithm: HashAlgorithm) -> CryptoResult<Box<dyn Hash>> {
        self.inner.hash(algorithm)
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> CryptoResult<Box<dyn Hmac>> {
        self.inner.hmac(algorithm, key)
    }

    fn kdf(&self, algorithm: KdfAlgorithm) -> CryptoResult<Box<dyn Kdf>> {
        self.inner.kdf(algorithm)
    }

    fn aead(&self, algorithm: AeadAlgorithm) -> CryptoResult<Box<dyn Aead>> {
        self.inner.aead(algorithm)
    }

    fn random(&self) -> &dyn Random {
        self.inner.random()
    }

    fn signature(&self, algorithm: SignatureAlgorithm) -> CryptoResult<Box<dyn Signature>> {
        if mocked(algorithm.public_key_algorithm()) {
            return Ok(Box::new(RecordingSignature {
                algorithm,
                log: Arc::clone(&self.log),
            }));
        }
        self.inner.signature(algorithm)
    }

    fn raw_signature(&self, algorithm: PublicKeyAlgorithm) -> CryptoResult<Box<dyn RawSignature>> {
        if mocked(algorithm) {
            return Ok(Box::new(RecordingRaw {
                algorithm,
                log: Arc::clone(&self.log),
            }));
        }
        self.inner.raw_signature(algorithm)
    }
}

/// Hash `data` with the provider.
pub fn hash(provider: &dyn CryptoProvider, algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    let mut h = provider.hash(algorithm).unwrap();
    h.update(data);
    h.finalize()
}

/// Default configuration with a `seconds` ticket lifetime.
pub fn lifetime(seconds: u32) -> Config {
    Config::builder()
        .with_ticket_lifetime(seconds)
        .build()
        .unwrap()
}

/// A TLS 1.3 client session that has sent psk_key_exchange_modes.
pub fn tls13_client() -> SecurityState {
    init_tracing();
    let mut session = SecurityState::new(Role::Client, ProtocolVersion::Tls13, Config::default());
    psk_key_exchange_modes::client_send(&mut session, &mut HandshakeBuffer::new()).unwrap();
    session
}

/// A TLS 1.3 server session that accepted psk_dhe_ke.
pub fn tls13_server() -> SecurityState {
    init_tracing();
    let mut session = SecurityState::new(Role::Server, ProtocolVersion::Tls13, Config::default());
    psk_key_exchange_modes::server_recv(&mut session, &[1, 1]).unwrap();
    session
}

/// A ClientHello built by the client send paths.
#[derive(Debug, Clone)]
pub struct BuiltHello {
    /// The complete message, header included.
    pub message: Vec<u8>,
    /// Body of the pre_shared_key extension.
    pub psk_body: Vec<u8>,
}

/// Write a ClientHello offering the client's PSK as the last extension.
pub fn client_hello(
    session: &mut SecurityState,
    provider: &dyn CryptoProvider,
    credentials: Option<&ClientPskCredentials>,
    ticket: Option<&ClientTicket>,
) -> hsauth_core::Result<BuiltHello> {
    let mut buf = HandshakeBuffer::new();
    let mut writer = ClientHelloWriter::begin(&mut buf, &[0x5a; 32], &[], &[0x1301, 0x1302])?;

    writer.start_extension(&mut buf, ExtensionType::PskKeyExchangeModes.to_u16())?;
    buf.put_prefixed8(&[1])?;
    writer.finish_extension(&mut buf)?;

    writer.start_extension(&mut buf, ExtensionType::PreSharedKey.to_u16())?;
    let body_start = buf.len();
    let layout = writer.layout();
    match pre_shared_key::client_send(session, provider, credentials, ticket, &mut buf, layout) {
        Ok(outcome) if outcome.is_present() => {}
        Ok(_) => writer.abandon_extension(&mut buf),
        Err(err) => {
            writer.abandon_extension(&mut buf);
            return Err(err);
        }
    }
    let psk_body = buf.as_bytes().get(body_start..).unwrap_or_default().to_vec();
    writer.finish(&mut buf)?;
    Ok(BuiltHello {
        message: buf.into_vec(),
        psk_body,
    })
}
