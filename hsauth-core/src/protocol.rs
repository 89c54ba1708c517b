//! TLS protocol constants and types.

/// TLS/SSL protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// SSL 3.0 (RFC 6101)
    Ssl30 = 0x0300,

    /// TLS 1.0 (RFC 2246)
    Tls10 = 0x0301,

    /// TLS 1.1 (RFC 4346)
    Tls11 = 0x0302,

    /// TLS 1.2 (RFC 5246)
    Tls12 = 0x0303,

    /// TLS 1.3 (RFC 8446)
    Tls13 = 0x0304,

    /// DTLS 1.0 (RFC 4347), signs like TLS 1.1
    Dtls10 = 0xFEFF,

    /// DTLS 1.2 (RFC 6347)
    Dtls12 = 0xFEFD,

    /// DTLS 1.3 (RFC 9147)
    Dtls13 = 0xFEFC,
}

impl ProtocolVersion {
    /// Convert from wire format.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0300 => Some(ProtocolVersion::Ssl30),
            0x0301 => Some(ProtocolVersion::Tls10),
            0x0302 => Some(ProtocolVersion::Tls11),
            0x0303 => Some(ProtocolVersion::Tls12),
            0x0304 => Some(ProtocolVersion::Tls13),
            0xFEFF => Some(ProtocolVersion::Dtls10),
            0xFEFD => Some(ProtocolVersion::Dtls12),
            0xFEFC => Some(ProtocolVersion::Dtls13),
            _ => None,
        }
    }

    /// Convert to wire format.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Get version name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Ssl30 => "SSL 3.0",
            ProtocolVersion::Tls10 => "TLS 1.0",
            ProtocolVersion::Tls11 => "TLS 1.1",
            ProtocolVersion::Tls12 => "TLS 1.2",
            ProtocolVersion::Tls13 => "TLS 1.3",
            ProtocolVersion::Dtls10 => "DTLS 1.0",
            ProtocolVersion::Dtls12 => "DTLS 1.2",
            ProtocolVersion::Dtls13 => "DTLS 1.3",
        }
    }

    /// Is this a DTLS version?
    pub const fn is_dtls(self) -> bool {
        matches!(
            self,
            ProtocolVersion::Dtls10 | ProtocolVersion::Dtls12 | ProtocolVersion::Dtls13
        )
    }

    /// Does this version negotiate (hash, signature) pairs on the wire?
    pub const fn has_selectable_sighash(self) -> bool {
        matches!(
            self,
            ProtocolVersion::Tls12
                | ProtocolVersion::Tls13
                | ProtocolVersion::Dtls12
                | ProtocolVersion::Dtls13
        )
    }

    /// Does this version use the TLS 1.3 key schedule?
    pub const fn is_tls13_family(self) -> bool {
        matches!(self, ProtocolVersion::Tls13 | ProtocolVersion::Dtls13)
    }
}

/// Which side of the connection a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Client
    Client,
    /// Server
    Server,
}

/// Handshake message types used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeType {
    /// ClientHello
    ClientHello = 1,

    /// ServerHello
    ServerHello = 2,

    /// NewSessionTicket
    NewSessionTicket = 4,

    /// Certificate
    Certificate = 11,

    /// ServerKeyExchange
    ServerKeyExchange = 12,

    /// CertificateVerify
    CertificateVerify = 15,

    /// Finished
    Finished = 20,
}

impl HandshakeType {
    /// Convert to wire format.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Size of the handshake message header (type + uint24 length).
pub const HANDSHAKE_HEADER_LEN: usize = 4;

/// Hello extension types used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ExtensionType {
    /// supported_versions (RFC 8446)
    SupportedVersions = 43,

    /// pre_shared_key (RFC 8446)
    PreSharedKey = 41,

    /// psk_key_exchange_modes (RFC 8446)
    PskKeyExchangeModes = 45,
}

impl ExtensionType {
    /// Convert to wire format.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}
