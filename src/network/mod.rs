//! A network abstraction layer for embedded systems
//!
//! This module provides the traits the HTTP and WebSocket clients are written
//! against. A transport only has to move bytes: it reports how many bytes can be
//! read without blocking, reads them, and writes them. Time and randomness are
//! injected as capabilities as well, so the protocol code never touches a global
//! clock or generator.

#![deny(unsafe_code)]

/// Common error types for network operations
pub mod error;

/// Application layer protocol clients
pub mod application;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Available, Clock, Close, Connection, RandomSource, Read, Write};
}

/// Non-blocking read side of a transport.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection.
    ///
    /// Returns `Ok(0)` when no data is ready at the moment.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Write side of a transport.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Teardown of a transport.
pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// Reports how many bytes can be read without blocking.
pub trait Available {
    /// Number of bytes that a following [`Read::read`] can return right away.
    fn available(&mut self) -> usize;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// Millisecond time source used for the idle-gap timeouts.
///
/// The clients never block on the transport. When no byte is ready they call
/// [`Clock::delay_ms`] and look again, and they give up once
/// [`Clock::now_ms`] has moved further than the configured timeout since the
/// last byte arrived.
pub trait Clock {
    /// Monotonic milliseconds since an arbitrary origin.
    fn now_ms(&mut self) -> u64;
    /// Pause for roughly `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Source of random bytes for WebSocket keys, masks and ping payloads.
pub trait RandomSource {
    /// Produce the next random byte.
    fn next_byte(&mut self) -> u8;
}

impl<F: FnMut() -> u8> RandomSource for F {
    fn next_byte(&mut self) -> u8 {
        self()
    }
}

/// [`Clock`] backed by [`std::time::Instant`] and [`std::thread::sleep`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&mut self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_random_source() {
        let mut counter = 0u8;
        let mut source = || {
            counter += 1;
            counter
        };
        assert_eq!(source.next_byte(), 1);
        assert_eq!(source.next_byte(), 2);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_std_clock_advances() {
        let mut clock = StdClock::new();
        let start = clock.now_ms();
        clock.delay_ms(5);
        assert!(clock.now_ms() >= start + 5);
    }
}
