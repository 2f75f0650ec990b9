//! Scripted transport, virtual clock and seeded randomness shared by the
//! integration tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use wirestream::network::error::Error;
use wirestream::network::*;

#[derive(Debug)]
pub struct MockConnection {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    write_limit: Option<usize>,
    is_open: bool,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            incoming: VecDeque::new(),
            written: Vec::new(),
            write_limit: None,
            is_open: true,
        }
    }

    /// A connection that will answer with `data`.
    pub fn with_response(data: &[u8]) -> Self {
        let mut conn = Self::new();
        conn.push_incoming(data);
        conn
    }

    /// Helper for tests to inject data the client will read
    pub fn push_incoming(&mut self, data: &[u8]) {
        self.incoming.extend(data.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Accept at most `limit` more bytes; writes past that return 0.
    pub fn limit_writes(&mut self, limit: usize) {
        self.write_limit = Some(limit);
    }

    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.is_open {
            return Err(Error::NotOpen);
        }
        let len = buf.len().min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..len)) {
            *slot = byte;
        }
        Ok(len)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !self.is_open {
            return Err(Error::NotOpen);
        }
        let len = match self.write_limit.as_mut() {
            Some(limit) => {
                let len = buf.len().min(*limit);
                *limit -= len;
                len
            }
            None => buf.len(),
        };
        self.written.extend_from_slice(&buf[..len]);
        Ok(len)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if !self.is_open {
            return Err(Error::NotOpen);
        }
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(mut self) -> Result<(), Self::Error> {
        self.is_open = false;
        Ok(())
    }
}

impl Available for MockConnection {
    fn available(&mut self) -> usize {
        if self.is_open { self.incoming.len() } else { 0 }
    }
}

impl Connection for MockConnection {}

/// Virtual clock; time only moves when the client sleeps.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A second handle on the same virtual time.
    pub fn handle(&self) -> Self {
        self.clone()
    }

    pub fn elapsed(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for MockClock {
    fn now_ms(&mut self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now.set(self.now.get() + u64::from(ms));
    }
}

/// Transport that hands out one byte every `interval_ms` of virtual time.
#[derive(Debug)]
pub struct TrickleConnection {
    inner: MockConnection,
    clock: MockClock,
    interval_ms: u64,
    next_release: u64,
}

impl TrickleConnection {
    pub fn new(data: &[u8], clock: &MockClock, interval_ms: u64) -> Self {
        Self {
            inner: MockConnection::with_response(data),
            clock: clock.handle(),
            interval_ms,
            next_release: clock.elapsed() + interval_ms,
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.pending()
    }

    fn ready(&self) -> bool {
        self.inner.pending() > 0 && self.clock.elapsed() >= self.next_release
    }
}

impl Read for TrickleConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() || !self.ready() {
            return Ok(0);
        }
        let len = self.inner.read(&mut buf[..1])?;
        self.next_release = self.clock.elapsed() + self.interval_ms;
        Ok(len)
    }
}

impl Write for TrickleConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

impl Close for TrickleConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.inner.close()
    }
}

impl Available for TrickleConnection {
    fn available(&mut self) -> usize {
        usize::from(self.ready())
    }
}

impl Connection for TrickleConnection {}

/// Deterministic byte source for keys, masks and ping payloads.
pub fn seeded_rng(seed: u64) -> impl FnMut() -> u8 {
    let mut rng = StdRng::seed_from_u64(seed);
    move || rng.r#gen::<u8>()
}

/// Split a single unfragmented frame into its first header byte and its
/// unmasked payload.
pub fn decode_frame(frame: &[u8]) -> (u8, Vec<u8>) {
    let first = frame[0];
    let masked = frame[1] & 0x80 != 0;
    let (len, mut pos) = match frame[1] & 0x7F {
        126 => (u16::from_be_bytes([frame[2], frame[3]]) as usize, 4),
        127 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&frame[2..10]);
            (u64::from_be_bytes(bytes) as usize, 10)
        }
        len => (len as usize, 2),
    };
    let mut mask = [0u8; 4];
    if masked {
        mask.copy_from_slice(&frame[pos..pos + 4]);
        pos += 4;
    }
    let payload = frame[pos..pos + len]
        .iter()
        .enumerate()
        .map(|(i, byte)| byte ^ mask[i % 4])
        .collect();
    (first, payload)
}
