//! # Application Layer Network Protocols
//!
//! Both clients work with any transport implementing
//! [`Connection`](crate::network::Connection) and
//! [`Available`](crate::network::Available), and take their notion of time
//! from a [`Clock`](crate::network::Clock).
//!
//! - **[`http`]**: incremental HTTP/1.1 client
//! - **[`websocket`]**: WebSocket client layered on the HTTP client
//!
//! ## Design Principles
//!
//! - **Connection Agnostic**: Any byte stream will do, plain TCP or TLS
//! - **No-std Compatible**: No heap allocation, all buffers are fixed-size
//! - **Streaming**: Requests and responses are never held in memory as a whole

/// HTTP client implementation.
///
/// Writes requests straight onto the connection and parses responses one byte
/// at a time, including chunked bodies.
pub mod http;

/// WebSocket protocol implementation.
///
/// Performs the upgrade handshake over [`http`] and exchanges framed messages
/// afterwards.
pub mod websocket;
