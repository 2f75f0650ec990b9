//! WebSocket client for embedded systems.
//!
//! The opening handshake is an HTTP `GET` with the upgrade headers, sent
//! through the [`http`](super::http) client on the same connection. After the
//! server switched protocols, messages are exchanged as frames:
//!
//! - outgoing messages are collected in a fixed-size buffer and sent as one
//!   final, masked frame by [`Client::end_message`]
//! - incoming frames are announced by [`Client::parse_message`] and their
//!   payload is read straight from the connection
//! - pings are answered automatically; pongs and close frames are consumed
//!
//! Fragmented outgoing messages, extensions and subprotocol negotiation are
//! not supported.

/// The WebSocket client.
pub mod client;

/// Frame header encoding, masking and opcodes.
pub mod frame;

pub use client::{Client, DEFAULT_TX_CAPACITY, HANDSHAKE_KEY_LEN, PING_PAYLOAD_LEN};
pub use frame::Opcode;
