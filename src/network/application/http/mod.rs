//! HTTP/1.1 protocol implementation for embedded systems.
//!
//! This module provides an incremental HTTP client designed for embedded
//! systems and `no_std` environments. Requests are written straight onto the
//! connection and responses are parsed one byte at a time, so neither side of
//! the exchange is ever held in memory as a whole.
//!
//! # Features
//!
//! - HTTP/1.1 request line and header writer, no request buffer
//! - GET, POST, PUT, PATCH and DELETE shortcuts
//! - Basic authentication encoded on the fly
//! - Status line parsing that skips interim `1xx` responses
//! - Header iteration with automatic `Content-Length` and chunked detection
//! - `Content-Length` and `Transfer-Encoding: chunked` bodies
//! - Idle-gap timeouts driven by an injected [`Clock`](crate::network::Clock)
//!
//! # Usage
//!
//! The main entry point is the [`Client`] which works with any connection
//! type implementing [`Connection`](crate::network::Connection) and
//! [`Available`](crate::network::Available).
//!
//! ```rust,no_run
//! use wirestream::network::application::http::{Client, Method, Request};
//! # use wirestream::network::{Available, Clock, Close, Connection, Read, Write};
//! # struct MockConnection;
//! # impl Connection for MockConnection {}
//! # impl Read for MockConnection {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for MockConnection {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for MockConnection {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Available for MockConnection {
//! #     fn available(&mut self) -> usize { 0 }
//! # }
//! # struct Ticks(u64);
//! # impl Clock for Ticks {
//! #     fn now_ms(&mut self) -> u64 { self.0 }
//! #     fn delay_ms(&mut self, ms: u32) { self.0 += ms as u64; }
//! # }
//!
//! let mut client = Client::new(MockConnection, Ticks(0));
//!
//! let request = Request::with_body(Method::Post, "/api/data", "application/json", br#"{"t":21}"#);
//! client.start_request(&request)?;
//!
//! if client.response_status_code()? == 200 {
//!     while client.header_available()? {
//!         // inspect client.read_header_name() / client.read_header_value()
//!     }
//!     let body: heapless::Vec<u8, 256> = client.response_body()?;
//! }
//! # Ok::<(), wirestream::network::error::Error>(())
//! ```

mod chunk;
mod response;

/// HTTP client implementation and supporting types.
///
/// Contains the main [`Client`](client::Client) struct, the request
/// description and the timing configuration.
pub mod client;

/// Phases of a request/response exchange.
pub mod state;

pub use client::{
    Client, Config, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESPONSE_TIMEOUT_MS, HEADER_LINE_CAPACITY,
    Method, Request,
};
pub use state::State;
