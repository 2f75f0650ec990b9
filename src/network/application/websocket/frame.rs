//! WebSocket frame header encoding and payload masking.

use crate::network::error::Error;
use heapless::Vec;

/// Set in the first header byte of the last frame of a message.
pub const FIN: u8 = 0x80;

/// Set in the second header byte when a mask key follows.
pub const MASK: u8 = 0x80;

/// Longest possible client frame header: 2 bytes plus a 64-bit length.
pub const MAX_HEADER_LEN: usize = 10;

/// Length value announcing a 16-bit extended length.
const LEN_16: u8 = 126;
/// Length value announcing a 64-bit extended length.
const LEN_64: u8 = 127;

/// WebSocket frame type.
///
/// # Examples
///
/// ```rust
/// use wirestream::network::application::websocket::Opcode;
///
/// assert_eq!(u8::from(Opcode::Text), 0x1);
/// assert_eq!(Opcode::try_from(0x9), Ok(Opcode::Ping));
/// assert!(Opcode::Close.is_control());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Continuation of a fragmented message.
    Continuation,
    /// UTF-8 text.
    Text,
    /// Binary data.
    Binary,
    /// Connection close.
    Close,
    /// Ping; answered with a pong carrying the same payload.
    Ping,
    /// Pong.
    Pong,
}

impl Opcode {
    /// Whether this is a control frame (close, ping or pong).
    pub fn is_control(&self) -> bool {
        matches!(self, Opcode::Close | Opcode::Ping | Opcode::Pong)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Opcode::Continuation),
            0x1 => Ok(Opcode::Text),
            0x2 => Ok(Opcode::Binary),
            0x8 => Ok(Opcode::Close),
            0x9 => Ok(Opcode::Ping),
            0xA => Ok(Opcode::Pong),
            _ => Err(Error::ProtocolError),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        match opcode {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Opcode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Opcode::Continuation => defmt::write!(f, "Continuation"),
            Opcode::Text => defmt::write!(f, "Text"),
            Opcode::Binary => defmt::write!(f, "Binary"),
            Opcode::Close => defmt::write!(f, "Close"),
            Opcode::Ping => defmt::write!(f, "Ping"),
            Opcode::Pong => defmt::write!(f, "Pong"),
        }
    }
}

/// Header of a final, masked client frame carrying `len` payload bytes.
///
/// The mask key is not part of the returned bytes.
pub fn encode_header(opcode: u8, len: usize) -> Vec<u8, MAX_HEADER_LEN> {
    let mut header = Vec::new();
    // capacity covers the longest encoding, pushes cannot fail
    let _ = header.push(FIN | (opcode & 0x0F));
    if len < LEN_16 as usize {
        let _ = header.push(MASK | len as u8);
    } else if len <= u16::MAX as usize {
        let _ = header.push(MASK | LEN_16);
        let _ = header.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        let _ = header.push(MASK | LEN_64);
        let _ = header.extend_from_slice(&(len as u64).to_be_bytes());
    }
    header
}

/// XOR `buf` with `mask`, starting at position `offset` of the key cycle.
#[inline]
pub fn apply_mask(buf: &mut [u8], mask: [u8; 4], offset: usize) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= mask[(offset + i) & 3];
    }
}
