//! Hello extensions that drive PSK negotiation.
//!
//! Each extension exposes `client_send`/`server_recv` for the ClientHello
//! direction and, where the server answers, `server_send`/`client_recv`.
//! Send paths append only the extension body; the caller frames it (see
//! [`ClientHelloWriter`](crate::messages::ClientHelloWriter)).

pub mod pre_shared_key;
pub mod psk_key_exchange_modes;

pub use psk_key_exchange_modes::PskKeyExchangeMode;
