//! WebSocket client riding on the HTTP client's connection.
//!
//! The handshake is an ordinary HTTP request. Once the server answered with
//! `101 Switching Protocols` the HTTP client stays in [`State::ReadingBody`]
//! and every byte on the connection is treated as part of a WebSocket frame.
//! The WebSocket layer only looks at that phase to decide whether `write`,
//! `read` and `available` mean raw HTTP bytes or framed payload.

use super::frame::{self, Opcode};
use crate::network::application::http::{self, State};
use crate::network::error::Error;
use crate::network::{Available, Clock, Connection, RandomSource};
use base64ct::{Base64, Encoding};
use core::fmt;
use heapless::{String, Vec};

/// Default capacity of the outgoing message buffer.
pub const DEFAULT_TX_CAPACITY: usize = 128;

/// Number of random bytes in the `Sec-WebSocket-Key` nonce.
pub const HANDSHAKE_KEY_LEN: usize = 16;

/// Number of random bytes sent by [`Client::ping`].
pub const PING_PAYLOAD_LEN: usize = 16;

/// Base64 length of the handshake nonce.
const ENCODED_KEY_LEN: usize = 24;

const SWITCHING_PROTOCOLS: u16 = 101;

/// A WebSocket client.
///
/// Outgoing messages are assembled in a buffer of `TX` bytes and sent as a
/// single masked frame. Data written beyond that capacity is dropped.
/// Incoming frames are read straight from the connection and unmasked as
/// they are read.
///
/// Ping, pong and close frames are handled inside
/// [`parse_message`](Client::parse_message) and never show up as payload.
///
/// # Examples
///
/// ```rust,no_run
/// use wirestream::network::application::websocket::{Client, Opcode};
/// # use wirestream::network::{Available, Clock, Close, Connection, Read, Write};
/// # struct Tcp;
/// # impl Connection for Tcp {}
/// # impl Read for Tcp {
/// #     type Error = ();
/// #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
/// # }
/// # impl Write for Tcp {
/// #     type Error = ();
/// #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
/// #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl Close for Tcp {
/// #     type Error = ();
/// #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl Available for Tcp {
/// #     fn available(&mut self) -> usize { 0 }
/// # }
/// # struct Ticks;
/// # impl Clock for Ticks {
/// #     fn now_ms(&mut self) -> u64 { 0 }
/// #     fn delay_ms(&mut self, _ms: u32) {}
/// # }
/// # let mut seed = 7u8;
/// # let rng = move || { seed = seed.wrapping_mul(31).wrapping_add(11); seed };
///
/// let mut ws = Client::new(Tcp, Ticks, rng);
/// ws.begin("/events")?;
///
/// ws.begin_message(Opcode::Text)?;
/// ws.write(b"hello")?;
/// ws.end_message()?;
///
/// if ws.parse_message()? > 0 {
///     let text: heapless::String<128> = ws.read_string()?;
/// }
/// # Ok::<(), wirestream::network::error::Error>(())
/// ```
pub struct Client<C, K, R, const TX: usize = DEFAULT_TX_CAPACITY>
where
    C: Connection + Available,
    K: Clock,
    R: RandomSource,
{
    http: http::Client<C, K>,
    rng: R,
    tx_started: bool,
    tx_opcode: u8,
    tx_buffer: Vec<u8, TX>,
    rx_opcode: u8,
    rx_size: u64,
    rx_masked: bool,
    rx_mask_key: [u8; 4],
    rx_mask_index: usize,
    close_received: bool,
}

impl<C, K, R> Client<C, K, R, DEFAULT_TX_CAPACITY>
where
    C: Connection + Available,
    K: Clock,
    R: RandomSource,
{
    /// Create a client with the default HTTP configuration and TX capacity.
    pub fn new(connection: C, clock: K, rng: R) -> Self {
        Self::from_http(http::Client::new(connection, clock), rng)
    }
}

impl<C, K, R, const TX: usize> Client<C, K, R, TX>
where
    C: Connection + Available,
    K: Clock,
    R: RandomSource,
{
    /// Wrap an existing HTTP client, e.g. one built with a custom
    /// [`Config`](http::Config).
    pub fn from_http(http: http::Client<C, K>, rng: R) -> Self {
        Self {
            http,
            rng,
            tx_started: false,
            tx_opcode: 0,
            tx_buffer: Vec::new(),
            rx_opcode: 0,
            rx_size: 0,
            rx_masked: false,
            rx_mask_key: [0; 4],
            rx_mask_index: 0,
            close_received: false,
        }
    }

    /// The HTTP client underneath.
    pub fn http(&self) -> &http::Client<C, K> {
        &self.http
    }

    /// Mutable access to the HTTP client, e.g. to change the response timeout.
    pub fn http_mut(&mut self) -> &mut http::Client<C, K> {
        &mut self.http
    }

    /// Give the HTTP client back.
    pub fn into_inner(self) -> http::Client<C, K> {
        self.http
    }

    fn upgraded(&self) -> bool {
        self.http.state() >= State::ReadingBody
    }

    /// Perform the opening handshake on `path`.
    ///
    /// Sends a `GET` with the upgrade headers and a fresh random key, then
    /// reads the status line and skips the response headers. Nothing is
    /// closed or retried on failure; the HTTP client is left wherever the
    /// exchange stopped.
    ///
    /// # Errors
    ///
    /// * [`Error::UnexpectedStatus`] - The server answered, but not with 101
    /// * [`Error::Timeout`] / [`Error::InvalidResponse`] - The reply could not be read
    pub fn begin(&mut self, path: &str) -> Result<(), Error> {
        self.begin_with_headers(path, &[])
    }

    /// [`begin`](Self::begin) with extra `(name, value)` header lines, e.g.
    /// `Host`, `Origin` or `Sec-WebSocket-Protocol`.
    pub fn begin_with_headers(
        &mut self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<(), Error> {
        let result = self.handshake(path, headers);
        self.rx_size = 0;
        self.rx_opcode = 0;
        self.close_received = false;
        result
    }

    fn handshake(&mut self, path: &str, headers: &[(&str, &str)]) -> Result<(), Error> {
        self.http.begin_request()?;
        self.http.get(path)?;

        let mut nonce = [0u8; HANDSHAKE_KEY_LEN];
        for byte in nonce.iter_mut() {
            *byte = self.rng.next_byte().clamp(0x01, 0xFE);
        }
        let mut encoded = [0u8; ENCODED_KEY_LEN];
        let key = Base64::encode(&nonce, &mut encoded).map_err(|_| Error::BufferOverflow)?;

        self.http.send_header("Upgrade", "websocket")?;
        self.http.send_header("Connection", "Upgrade")?;
        self.http.send_header("Sec-WebSocket-Key", key)?;
        self.http.send_header("Sec-WebSocket-Version", 13)?;
        for (name, value) in headers {
            self.http.send_header(name, value)?;
        }
        self.http.end_request()?;

        let status = self.http.response_status_code()?;
        self.http.skip_response_headers()?;

        if status == SWITCHING_PROTOCOLS {
            self.http.switch_protocols();
            debug!("websocket upgraded on {}", path);
            Ok(())
        } else {
            warn!("websocket upgrade refused with {}", status);
            Err(Error::UnexpectedStatus(status))
        }
    }

    /// Start assembling an outgoing message of the given type.
    ///
    /// Only the low four bits of `opcode` are used.
    pub fn begin_message(&mut self, opcode: impl Into<u8>) -> Result<(), Error> {
        if self.tx_started {
            return Err(Error::TxInProgress);
        }
        self.tx_started = true;
        self.tx_opcode = opcode.into() & 0x0F;
        self.tx_buffer.clear();
        Ok(())
    }

    /// Add payload to the open message.
    ///
    /// Before the handshake completed the bytes go straight to the connection
    /// as HTTP body data. Afterwards they are buffered; whatever does not fit
    /// into the `TX` bytes of the buffer is dropped, and the returned count
    /// says how much was kept.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        if !self.upgraded() {
            return self.http.write(data);
        }
        if !self.tx_started {
            return Err(Error::TxNotStarted);
        }

        let room = TX - self.tx_buffer.len();
        let accepted = data.len().min(room);
        self.tx_buffer
            .extend_from_slice(&data[..accepted])
            .map_err(|_| Error::BufferOverflow)?;
        if accepted < data.len() {
            warn!("message truncated at {} bytes", TX);
        }
        Ok(accepted)
    }

    /// Send the open message as one final, masked frame.
    ///
    /// # Errors
    ///
    /// * [`Error::TxNotStarted`] - No message was begun
    /// * [`Error::ShortWrite`] - The connection did not take the whole frame
    pub fn end_message(&mut self) -> Result<(), Error> {
        if !self.tx_started {
            return Err(Error::TxNotStarted);
        }

        let header = frame::encode_header(self.tx_opcode, self.tx_buffer.len());
        let mut mask = [0u8; 4];
        for byte in mask.iter_mut() {
            *byte = self.rng.next_byte();
        }
        frame::apply_mask(&mut self.tx_buffer, mask, 0);

        self.tx_started = false;
        let result = self.send_frame(&header, &mask);
        self.tx_buffer.clear();
        result
    }

    fn send_frame(&mut self, header: &[u8], mask: &[u8; 4]) -> Result<(), Error> {
        trace!(
            "sending frame, opcode {} with {} bytes",
            self.tx_opcode,
            self.tx_buffer.len()
        );
        if self.http.write_raw(header)? != header.len() || self.http.write_raw(mask)? != mask.len()
        {
            return Err(Error::ShortWrite);
        }
        let written = self.http.write_raw(&self.tx_buffer)?;
        self.http.flush()?;

        if written == self.tx_buffer.len() {
            Ok(())
        } else {
            Err(Error::ShortWrite)
        }
    }

    /// Read the header of the next incoming frame.
    ///
    /// Whatever is left of the previous frame is discarded first. Returns the
    /// payload length of a data frame, or 0 when no frame is ready or the
    /// frame was a control frame that has already been dealt with: a ping is
    /// answered with a pong carrying the same payload, pongs are dropped, and
    /// a close is recorded (see [`close_received`](Self::close_received)).
    ///
    /// A continuation frame keeps the type of the message it continues: its
    /// header byte is OR-ed into the recorded one, which also carries over
    /// its FIN bit.
    pub fn parse_message(&mut self) -> Result<u64, Error> {
        self.flush_rx()?;

        if self.http.available()? < 2 {
            return Ok(0);
        }

        let mut head = [0u8; 2];
        self.read_header_bytes(&mut head)?;
        let [opcode, length] = head;

        if opcode & 0x0F == 0 {
            self.rx_opcode |= opcode;
        } else {
            self.rx_opcode = opcode;
        }

        self.rx_masked = length & frame::MASK != 0;
        self.rx_size = match length & 0x7F {
            126 => {
                let mut extended = [0u8; 2];
                self.read_header_bytes(&mut extended)?;
                u64::from(u16::from_be_bytes(extended))
            }
            127 => {
                let mut extended = [0u8; 8];
                self.read_header_bytes(&mut extended)?;
                u64::from_be_bytes(extended)
            }
            len => u64::from(len),
        };

        if self.rx_masked {
            let mut key = [0u8; 4];
            self.read_header_bytes(&mut key)?;
            self.rx_mask_key = key;
        }
        self.rx_mask_index = 0;

        trace!(
            "frame received, opcode {} with {} bytes",
            self.message_type(),
            self.rx_size
        );

        match Opcode::try_from(self.message_type()) {
            Ok(Opcode::Close) => {
                debug!("close frame received");
                self.close_received = true;
                self.flush_rx()?;
                self.rx_size = 0;
            }
            Ok(Opcode::Ping) => {
                self.answer_ping()?;
                self.rx_size = 0;
            }
            Ok(Opcode::Pong) => {
                self.flush_rx()?;
                self.rx_size = 0;
            }
            _ => {}
        }

        Ok(self.rx_size)
    }

    fn read_header_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if self.http.read_bytes(buf)? == buf.len() {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    fn answer_ping(&mut self) -> Result<(), Error> {
        if self.tx_started {
            warn!("ping dropped, a message is being assembled");
            return self.flush_rx();
        }

        self.begin_message(Opcode::Pong)?;
        let mut chunk = [0u8; 16];
        while self.available()? > 0 {
            let count = self.read(&mut chunk)?;
            if count == 0 {
                break;
            }
            self.write(&chunk[..count])?;
        }
        self.end_message()
    }

    fn flush_rx(&mut self) -> Result<(), Error> {
        let mut scratch = [0u8; 16];
        while self.available()? > 0 {
            if self.read(&mut scratch)? == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Type of the current incoming message (low four bits of the opcode).
    pub fn message_type(&self) -> u8 {
        self.rx_opcode & 0x0F
    }

    /// [`message_type`](Self::message_type) as an [`Opcode`].
    ///
    /// # Errors
    ///
    /// * [`Error::ProtocolError`] - The server used a reserved opcode
    pub fn opcode(&self) -> Result<Opcode, Error> {
        Opcode::try_from(self.message_type())
    }

    /// Whether the current incoming frame is the last one of its message.
    pub fn is_final(&self) -> bool {
        self.rx_opcode & frame::FIN != 0
    }

    /// Whether the server sent a close frame.
    pub fn close_received(&self) -> bool {
        self.close_received
    }

    /// Payload bytes left in the current frame.
    ///
    /// Before the handshake this is the HTTP body availability.
    pub fn available(&mut self) -> Result<usize, Error> {
        if !self.upgraded() {
            return self.http.available();
        }
        Ok(usize::try_from(self.rx_size).unwrap_or(usize::MAX))
    }

    /// Read payload of the current frame into `buf`, unmasked.
    ///
    /// Never reads past the end of the frame. The mask position is kept
    /// between calls, so a payload can be consumed in pieces of any size.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if !self.upgraded() {
            return self.http.read_bytes(buf);
        }

        let remaining = usize::try_from(self.rx_size).unwrap_or(usize::MAX);
        let wanted = buf.len().min(remaining);
        let count = self.http.read_bytes(&mut buf[..wanted])?;
        self.rx_size -= count as u64;

        if self.rx_masked {
            frame::apply_mask(&mut buf[..count], self.rx_mask_key, self.rx_mask_index);
            self.rx_mask_index = (self.rx_mask_index + count) & 3;
        }
        Ok(count)
    }

    /// Read a single payload byte.
    pub fn read_byte(&mut self) -> Result<Option<u8>, Error> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Look at the next payload byte, unmasked, without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>, Error> {
        if self.upgraded() && self.rx_size == 0 {
            return Ok(None);
        }
        let byte = self.http.peek()?;
        if self.upgraded() && self.rx_masked {
            return Ok(byte.map(|b| b ^ self.rx_mask_key[self.rx_mask_index & 3]));
        }
        Ok(byte)
    }

    /// Read the available payload (up to `N` bytes) as text.
    ///
    /// # Errors
    ///
    /// * [`Error::Utf8`] - The payload is not valid UTF-8
    pub fn read_string<const N: usize>(&mut self) -> Result<String<N>, Error> {
        let wanted = self.available()?.min(N);
        let mut bytes: Vec<u8, N> = Vec::new();
        bytes
            .resize(wanted, 0)
            .map_err(|_| Error::BufferOverflow)?;
        let count = self.read(&mut bytes)?;
        bytes.truncate(count);
        String::from_utf8(bytes).map_err(|_| Error::Utf8)
    }

    /// Send a ping carrying [`PING_PAYLOAD_LEN`] random bytes.
    pub fn ping(&mut self) -> Result<(), Error> {
        let mut payload = [0u8; PING_PAYLOAD_LEN];
        for byte in payload.iter_mut() {
            *byte = self.rng.next_byte();
        }
        self.begin_message(Opcode::Ping)?;
        self.write(&payload)?;
        self.end_message()
    }
}

impl<C, K, R, const TX: usize> fmt::Debug for Client<C, K, R, TX>
where
    C: Connection + Available,
    K: Clock,
    R: RandomSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("http", &self.http)
            .field("tx_started", &self.tx_started)
            .field("tx_len", &self.tx_buffer.len())
            .field("rx_opcode", &self.rx_opcode)
            .field("rx_size", &self.rx_size)
            .field("close_received", &self.close_received)
            .finish_non_exhaustive()
    }
}
