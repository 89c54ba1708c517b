//! Error types for the handshake authentication core.
//!
//! Every failure is fatal to the handshake that produced it. The enclosing
//! state machine sends [`Error::alert`] and aborts; nothing here is retried.

use hsauth_crypto::Error as CryptoError;

/// Result type for core operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Core error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A scratch or secret buffer could not be allocated.
    #[error("memory allocation failed")]
    Memory,

    /// A caller broke an integration contract (bad offsets, missing state).
    #[error("internal error: {0}")]
    Internal(String),

    /// The negotiated parameters cannot drive the requested operation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Malformed wire data from the peer.
    #[error("decode error: {0}")]
    Decode(String),

    /// A locally configured credential is unusable.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The peer failed to prove possession of the PSK.
    #[error("insufficient credentials: {0}")]
    InsufficientCredentials(String),

    /// The certificate does not permit digital signatures.
    #[error("key usage violation")]
    KeyUsageViolation,

    /// No hash could be determined for the signature.
    #[error("unknown hash algorithm")]
    UnknownHashAlgorithm,

    /// The public-key algorithm cannot perform the operation.
    #[error("unknown public key algorithm")]
    UnknownPkAlgorithm,

    /// The signature algorithm is absent, disabled or not acceptable.
    #[error("unwanted algorithm: {0}")]
    UnwantedAlgorithm(String),

    /// The signature algorithm does not match the certificate key.
    #[error("signature algorithm incompatible with key: {0}")]
    IncompatibleSignatureKey(String),

    /// A signature did not verify.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// A certificate was needed and none is available.
    #[error("certificate required: {0}")]
    CertificateRequired(String),

    /// An extension arrived in a state that does not allow it.
    #[error("unexpected extension: {0}")]
    UnexpectedExtension(String),

    /// A well-formed field carries a value the protocol forbids.
    #[error("illegal parameter: {0}")]
    IllegalParameter(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure inside the crypto provider.
    #[error("crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::SignatureVerificationFailed | CryptoError::InvalidSignature => {
                Error::SignatureVerificationFailed
            }
            other => Error::Crypto(other),
        }
    }
}

impl Error {
    /// The fatal alert the handshake sends for this error.
    pub const fn alert(&self) -> AlertDescription {
        match self {
            Error::Memory
            | Error::Internal(_)
            | Error::Protocol(_)
            | Error::InvalidConfig(_)
            | Error::Crypto(_) => AlertDescription::InternalError,
            Error::Decode(_) => AlertDescription::DecodeError,
            Error::InvalidCredential(_) => AlertDescription::InternalError,
            Error::InsufficientCredentials(_) => AlertDescription::DecryptError,
            Error::KeyUsageViolation => AlertDescription::UnsupportedCertificate,
            Error::UnknownHashAlgorithm
            | Error::UnknownPkAlgorithm
            | Error::UnwantedAlgorithm(_) => AlertDescription::HandshakeFailure,
            Error::IncompatibleSignatureKey(_) => AlertDescription::IllegalParameter,
            Error::SignatureVerificationFailed => AlertDescription::DecryptError,
            Error::CertificateRequired(_) => AlertDescription::CertificateRequired,
            Error::UnexpectedExtension(_) => AlertDescription::UnsupportedExtension,
            Error::IllegalParameter(_) => AlertDescription::IllegalParameter,
        }
    }

    /// True for failures caused by the peer's data or credentials.
    pub const fn is_peer_induced(&self) -> bool {
        matches!(
            self,
            Error::Decode(_)
                | Error::InsufficientCredentials(_)
                | Error::SignatureVerificationFailed
                | Error::UnexpectedExtension(_)
                | Error::IllegalParameter(_)
                | Error::IncompatibleSignatureKey(_)
        )
    }
}

/// Result of writing a hello extension.
///
/// `Written(0)` is an extension present with an empty body. It is a distinct
/// outcome from `NotApplicable`, where the extension is left out entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionOutcome {
    /// Nothing to send; the extension is omitted.
    NotApplicable,
    /// The extension body was appended; the count of bytes written.
    Written(usize),
}

impl ExtensionOutcome {
    /// Bytes appended to the buffer.
    pub const fn len(self) -> usize {
        match self {
            ExtensionOutcome::NotApplicable => 0,
            ExtensionOutcome::Written(n) => n,
        }
    }

    /// Whether the extension is part of the message.
    pub const fn is_present(self) -> bool {
        matches!(self, ExtensionOutcome::Written(_))
    }
}

/// TLS alert descriptions (RFC 8446, Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    /// Unexpected message
    UnexpectedMessage = 10,
    /// Handshake failure
    HandshakeFailure = 40,
    /// Unsupported certificate
    UnsupportedCertificate = 43,
    /// Illegal parameter
    IllegalParameter = 47,
    /// Decode error
    DecodeError = 50,
    /// Decrypt error
    DecryptError = 51,
    /// Internal error
    InternalError = 80,
    /// Unsupported extension
    UnsupportedExtension = 110,
    /// Unknown PSK identity
    UnknownPskIdentity = 115,
    /// Certificate required
    CertificateRequired = 116,
}

impl AlertDescription {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            10 => Some(AlertDescription::UnexpectedMessage),
            40 => Some(AlertDescription::HandshakeFailure),
            43 => Some(AlertDescription::UnsupportedCertificate),
            47 => Some(AlertDescription::IllegalParameter),
            50 => Some(AlertDescription::DecodeError),
            51 => Some(AlertDescription::DecryptError),
            80 => Some(AlertDescription::InternalError),
            110 => Some(AlertDescription::UnsupportedExtension),
            115 => Some(AlertDescription::UnknownPskIdentity),
            116 => Some(AlertDescription::CertificateRequired),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}
