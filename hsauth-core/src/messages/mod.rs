//! Handshake messages this crate writes or parses.

pub mod client_hello;
pub mod new_session_ticket;

pub use client_hello::{ClientHelloLayout, ClientHelloWriter};
pub use new_session_ticket::NewSessionTicket;
