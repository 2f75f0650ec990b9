//! # wirestream - streaming HTTP and WebSocket for small devices
//!
//! An HTTP/1.1 client and a WebSocket client that run over any byte stream a
//! device can offer: a TCP socket, a TLS session, a modem's serial link. The
//! library never buffers a whole request or response; it writes requests as
//! they are described and parses responses one byte at a time, so it fits on
//! microcontrollers with a few kilobytes of RAM. It supports `no_std`
//! environments.
//!
//! ## Features
//!
//! ### HTTP
//! - Request line and headers written directly to the connection
//! - Basic authentication encoded on the fly
//! - Status line, header iteration, `Content-Length` and chunked bodies
//! - Idle-gap timeouts driven by an injected clock
//!
//! ### WebSocket
//! - Upgrade handshake with a random `Sec-WebSocket-Key`
//! - Masked outgoing frames, incoming frames read as a stream
//! - Automatic pong replies and close detection
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! wirestream = "0.1.0"
//! ```
//!
//! ### Basic HTTP Client Example
//!
//! ```rust,no_run
//! use wirestream::network::application::http::Client;
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
//! # struct Ticks;
//! # impl Clock for Ticks {
//! #     fn now_ms(&mut self) -> u64 { 0 }
//! #     fn delay_ms(&mut self, _ms: u32) {}
//! # }
//!
//! let mut client = Client::new(MockConnection, Ticks);
//!
//! client.get("/api/data")?;
//! let status = client.response_status_code()?;
//! let body: heapless::String<256> = client.response_body_str()?;
//! # Ok::<(), wirestream::network::error::Error>(())
//! ```
//!
//! ### WebSocket Example
//!
//! ```rust,no_run
//! use wirestream::network::application::websocket::{Client, Opcode};
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
//! # struct Ticks;
//! # impl Clock for Ticks {
//! #     fn now_ms(&mut self) -> u64 { 0 }
//! #     fn delay_ms(&mut self, _ms: u32) {}
//! # }
//!
//! let mut ws = Client::new(MockConnection, Ticks, || 0x5Au8);
//! ws.begin("/socket")?;
//!
//! ws.begin_message(Opcode::Binary)?;
//! ws.write(&[0x01, 0x02])?;
//! ws.end_message()?;
//! # Ok::<(), wirestream::network::error::Error>(())
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support, including `StdClock` (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging
//! - `log`: Route the same log statements through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Network abstraction layer and the protocol clients built on it.
///
/// Holds the transport, clock and randomness traits, the shared error type,
/// and the HTTP and WebSocket clients.
pub mod network;
