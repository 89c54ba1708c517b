//! Pre-shared keys: binders, the offered-PSK parser, session tickets and
//! credentials.

pub mod binder;
pub mod credentials;
pub mod parser;
pub mod ticket;
pub mod ticket_keys;

pub use binder::{compute_binder, verify_binder, BinderTranscript};
pub use credentials::{ClientPskCredentials, ServerPskCredentials};
pub use parser::{OfferedPsk, PskExtParser};
pub use ticket::{ClientTicket, PskExtState, SessionTicket};
pub use ticket_keys::{OpenedTicket, TicketDecrypter, TicketKeyRing};
