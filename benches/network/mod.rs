use std::collections::VecDeque;
use wirestream::network::error::Error;
use wirestream::network::{Available, Clock, Close, Connection, Read, Write};

pub mod application;

/// In-memory connection: reads drain `incoming`, writes pile up in `outgoing`.
#[derive(Debug, Default)]
pub struct Loopback {
    pub incoming: VecDeque<u8>,
    pub outgoing: Vec<u8>,
}

impl Loopback {
    pub fn with_incoming(data: &[u8]) -> Self {
        Self {
            incoming: data.iter().copied().collect(),
            outgoing: Vec::new(),
        }
    }
}

impl Read for Loopback {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let len = buf.len().min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..len)) {
            *slot = byte;
        }
        Ok(len)
    }
}

impl Write for Loopback {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.outgoing.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for Loopback {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Available for Loopback {
    fn available(&mut self) -> usize {
        self.incoming.len()
    }
}

impl Connection for Loopback {}

/// Clock that only moves when the client sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepClock(u64);

impl Clock for StepClock {
    fn now_ms(&mut self) -> u64 {
        self.0
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0 += u64::from(ms);
    }
}
