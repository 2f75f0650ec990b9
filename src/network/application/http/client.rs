//! HTTP/1.1 request writer and the byte layer shared with the response parser.
//!
//! Nothing is buffered on the way out: the request line, every header and the
//! body go straight to the connection as they are produced. The only state the
//! client keeps is the current [`State`] and the bookkeeping the response parser
//! needs to walk the reply one byte at a time.

use super::chunk::ChunkState;
use super::state::State;
use crate::network::error::Error;
use crate::network::{Available, Clock, Close, Connection, Read, Write};
use base64ct::{Base64, Encoding};
use core::fmt;
use heapless::String;

/// Longest header line kept by [`Client::header_available`]; longer lines are truncated.
pub const HEADER_LINE_CAPACITY: usize = 128;

/// Default idle gap, in milliseconds, after which a response read gives up.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u32 = 30_000;

/// Default pause, in milliseconds, between two polls of an idle connection.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1_000;

pub(super) const CONTENT_LENGTH: &str = "Content-Length";
pub(super) const CONTENT_TYPE: &str = "Content-Type";

/// HTTP request methods supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// The method token as it appears on the request line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Timing configuration of a [`Client`].
///
/// # Examples
///
/// ```rust
/// use wirestream::network::application::http::Config;
///
/// let config = Config {
///     response_timeout_ms: 5_000,
///     ..Config::default()
/// };
/// assert_eq!(config.poll_interval_ms, 1_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Longest gap between two received bytes before a read fails with
    /// [`Error::Timeout`]. The timer restarts on every byte, so a slow but
    /// steady response never times out.
    pub response_timeout_ms: u32,

    /// How long to sleep when the connection has nothing to read.
    pub poll_interval_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// A request handed to [`Client::start_request`].
///
/// `content_length` overrides the length announced in the `Content-Length`
/// header. This lets a caller announce a body and then stream it with
/// [`Client::write`] instead of passing it here. A `body` longer than the
/// announced length is cut to that length.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    /// The request method.
    pub method: Method,
    /// Path (and query) exactly as it should appear on the request line.
    pub path: &'a str,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<&'a str>,
    /// Announced body length; defaults to the length of `body`.
    pub content_length: Option<usize>,
    /// Body written right after the headers.
    pub body: Option<&'a [u8]>,
}

impl<'a> Request<'a> {
    /// A request without headers or body.
    pub fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            content_type: None,
            content_length: None,
            body: None,
        }
    }

    /// A request carrying `body` with the given content type.
    pub fn with_body(method: Method, path: &'a str, content_type: &'a str, body: &'a [u8]) -> Self {
        Self {
            method,
            path,
            content_type: Some(content_type),
            content_length: None,
            body: Some(body),
        }
    }
}

/// An incremental HTTP/1.1 client bound to one connection.
///
/// The client handles one request at a time. A request is written with
/// [`start_request`](Client::start_request) (or one of the method shortcuts),
/// then the response is pulled out with
/// [`response_status_code`](Client::response_status_code), the header
/// accessors, and [`read`](Client::read) /
/// [`response_body`](Client::response_body).
///
/// # Type Parameters
///
/// * `C` - The connection, which must also report [`Available`] bytes
/// * `K` - The [`Clock`] used for idle-gap timeouts
///
/// # Examples
///
/// ```rust,no_run
/// use wirestream::network::application::http::Client;
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
///
/// let mut client = Client::new(Tcp, Ticks);
/// client.get("/status")?;
/// let status = client.response_status_code()?;
/// let body: heapless::Vec<u8, 512> = client.response_body()?;
/// # Ok::<(), wirestream::network::error::Error>(())
/// ```
pub struct Client<C, K>
where
    C: Connection + Available,
    K: Clock,
{
    pub(super) connection: C,
    pub(super) clock: K,
    pub(super) config: Config,
    pub(super) state: State,
    pub(super) status_code: u16,
    pub(super) content_length: Option<usize>,
    pub(super) body_consumed: usize,
    pub(super) content_length_cursor: usize,
    pub(super) chunked_cursor: usize,
    pub(super) is_chunked: bool,
    pub(super) chunk: ChunkState,
    pub(super) header_line: String<HEADER_LINE_CAPACITY>,
    lookahead: Option<u8>,
}

impl<C, K> Client<C, K>
where
    C: Connection + Available,
    K: Clock,
{
    /// Create a client with the default [`Config`].
    pub fn new(connection: C, clock: K) -> Self {
        Self::with_config(connection, clock, Config::default())
    }

    /// Create a client with an explicit [`Config`].
    pub fn with_config(connection: C, clock: K, config: Config) -> Self {
        Self {
            connection,
            clock,
            config,
            state: State::Idle,
            status_code: 0,
            content_length: None,
            body_consumed: 0,
            content_length_cursor: 0,
            chunked_cursor: 0,
            is_chunked: false,
            chunk: ChunkState::default(),
            header_line: String::new(),
            lookahead: None,
        }
    }

    /// Forget everything about the current exchange and go back to [`State::Idle`].
    ///
    /// Bytes still sitting in the connection are not touched, but a byte
    /// held back by [`peek`](Self::peek) is dropped. The timing configuration
    /// is kept.
    pub fn reset_state(&mut self) {
        self.state = State::Idle;
        self.lookahead = None;
        self.status_code = 0;
        self.content_length = None;
        self.body_consumed = 0;
        self.content_length_cursor = 0;
        self.chunked_cursor = 0;
        self.is_chunked = false;
        self.chunk = ChunkState::default();
        self.header_line.clear();
    }

    /// Treat everything after the response headers as a raw byte stream.
    ///
    /// Used once a `101 Switching Protocols` reply has been read: body
    /// length and chunked framing announced by that reply no longer apply.
    pub(crate) fn switch_protocols(&mut self) {
        self.state = State::ReadingBody;
        self.content_length = None;
        self.body_consumed = 0;
        self.is_chunked = false;
        self.chunk = ChunkState::default();
    }

    /// The current phase of the exchange.
    pub fn state(&self) -> State {
        self.state
    }

    /// The timing configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Change the idle gap after which response reads time out.
    pub fn set_http_response_timeout(&mut self, timeout_ms: u32) {
        self.config.response_timeout_ms = timeout_ms;
    }

    /// Direct access to the underlying connection.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Give the connection back.
    pub fn into_inner(self) -> C {
        self.connection
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<(), Error> {
        self.connection.close().map_err(|_| Error::ConnectionClosed)
    }

    // --- Request writer ---

    /// Put the client into manual mode for the next request.
    ///
    /// A following [`start_request`](Self::start_request) (or `get`, `post`, ...)
    /// writes the request line but leaves the header block open, so more
    /// headers can be added with [`send_header`](Self::send_header) before
    /// [`end_request`](Self::end_request). Any unread part of a previous
    /// response is discarded.
    pub fn begin_request(&mut self) -> Result<(), Error> {
        if self.state.request_sent() {
            self.flush_rx()?;
            self.reset_state();
        }
        self.state = State::RequestStarted;
        Ok(())
    }

    /// Write a request to the connection.
    ///
    /// If the previous response body has not been read completely it is
    /// drained and discarded first. Unless the client is in manual mode (see
    /// [`begin_request`](Self::begin_request)) or a body is supplied, the
    /// header block is terminated right away.
    ///
    /// # Errors
    ///
    /// * [`Error::ApiMisuse`] - A previous response is still being read
    /// * [`Error::WriteError`] - The connection refused the data
    pub fn start_request(&mut self, request: &Request<'_>) -> Result<(), Error> {
        if self.state.end_of_headers() {
            self.flush_rx()?;
            self.reset_state();
        }

        let initial = self.state;
        if initial != State::Idle && initial != State::RequestStarted {
            return Err(Error::ApiMisuse);
        }

        self.send_request_line(request.method, request.path)?;

        if let Some(content_type) = request.content_type {
            self.send_header(CONTENT_TYPE, content_type)?;
        }

        let body = request.body.unwrap_or(&[]);
        let length = request.content_length.unwrap_or(body.len());
        // never send more than announced
        let body = &body[..length.min(body.len())];
        if length > 0 {
            self.send_header(CONTENT_LENGTH, length)?;
        }

        let has_body = !body.is_empty();
        if initial == State::Idle || has_body {
            self.finish_headers()?;
        }

        if has_body {
            self.send(body)?;
            self.flush()?;
        }

        Ok(())
    }

    /// `GET path`
    pub fn get(&mut self, path: &str) -> Result<(), Error> {
        self.start_request(&Request::new(Method::Get, path))
    }

    /// `POST path` with an optional body.
    pub fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<(), Error> {
        self.start_request(&Request::with_body(Method::Post, path, content_type, body))
    }

    /// `PUT path` with an optional body.
    pub fn put(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<(), Error> {
        self.start_request(&Request::with_body(Method::Put, path, content_type, body))
    }

    /// `PATCH path` with an optional body.
    pub fn patch(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<(), Error> {
        self.start_request(&Request::with_body(Method::Patch, path, content_type, body))
    }

    /// `DELETE path` with an optional body.
    pub fn delete(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<(), Error> {
        self.start_request(&Request::with_body(Method::Delete, path, content_type, body))
    }

    /// Write one `name: value` header line.
    ///
    /// Only valid between the request line and the end of the header block.
    pub fn send_header<V: fmt::Display>(&mut self, name: &str, value: V) -> Result<(), Error> {
        self.expect_headers_open()?;
        self.send_fmt(format_args!("{}: {}\r\n", name, value))
    }

    /// Write a complete, preformatted header line (without the trailing CRLF).
    pub fn send_header_line(&mut self, line: &str) -> Result<(), Error> {
        self.expect_headers_open()?;
        self.send(line.as_bytes())?;
        self.send(b"\r\n")
    }

    /// Write an `Authorization: Basic` header for `user` and `password`.
    ///
    /// `user:password` is encoded three input bytes at a time, so the full
    /// credential string never has to exist in memory.
    pub fn send_basic_auth(&mut self, user: &str, password: &str) -> Result<(), Error> {
        self.expect_headers_open()?;
        self.send(b"Authorization: Basic ")?;

        let credentials = user
            .bytes()
            .chain(core::iter::once(b':'))
            .chain(password.bytes());

        let mut input = [0u8; 3];
        let mut filled = 0;
        for byte in credentials {
            input[filled] = byte;
            filled += 1;
            if filled == input.len() {
                self.send_base64(&input)?;
                filled = 0;
            }
        }
        if filled > 0 {
            self.send_base64(&input[..filled])?;
        }

        self.send(b"\r\n")
    }

    /// Terminate the header block if that has not happened yet.
    pub fn end_request(&mut self) -> Result<(), Error> {
        match self.state {
            State::Idle => Err(Error::ApiMisuse),
            State::RequestStarted => self.finish_headers(),
            _ => Ok(()),
        }
    }

    /// Write raw bytes, e.g. a request body announced with `content_length`.
    ///
    /// The header block is terminated first if it is still open. Returns how
    /// many bytes the connection accepted.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        if self.state == State::RequestStarted {
            self.finish_headers()?;
        }
        self.write_raw(data)
    }

    /// Flush the connection.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.connection.flush().map_err(|_| Error::WriteError)
    }

    fn send_request_line(&mut self, method: Method, path: &str) -> Result<(), Error> {
        self.send_fmt(format_args!("{} {} HTTP/1.1\r\n", method.as_str(), path))?;
        self.state = State::RequestStarted;
        debug!("request started: {} {}", method.as_str(), path);
        Ok(())
    }

    fn finish_headers(&mut self) -> Result<(), Error> {
        self.send(b"\r\n")?;
        self.state = State::RequestSent;
        self.flush()
    }

    fn expect_headers_open(&self) -> Result<(), Error> {
        if self.state == State::RequestStarted {
            Ok(())
        } else {
            Err(Error::ApiMisuse)
        }
    }

    fn send_base64(&mut self, input: &[u8]) -> Result<(), Error> {
        let mut output = [0u8; 4];
        let encoded = Base64::encode(input, &mut output).map_err(|_| Error::BufferOverflow)?;
        self.send(encoded.as_bytes())
    }

    fn send_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), Error> {
        let mut wire = Wire {
            connection: &mut self.connection,
            error: None,
        };
        match fmt::write(&mut wire, args) {
            Ok(()) => Ok(()),
            Err(_) => Err(wire.error.unwrap_or(Error::WriteError)),
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<(), Error> {
        write_all(&mut self.connection, data)
    }

    pub(crate) fn write_raw(&mut self, data: &[u8]) -> Result<usize, Error> {
        let mut written = 0;
        while written < data.len() {
            match self.connection.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(_) => return Err(Error::WriteError),
            }
        }
        Ok(written)
    }

    // --- Byte layer ---

    /// Bytes ready on the connection, including a peeked byte.
    pub(super) fn raw_available(&mut self) -> usize {
        usize::from(self.lookahead.is_some()) + self.connection.available()
    }

    pub(super) fn raw_read(&mut self) -> Result<Option<u8>, Error> {
        if let Some(byte) = self.lookahead.take() {
            return Ok(Some(byte));
        }
        let mut byte = [0u8; 1];
        match self.connection.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(_) => Err(Error::ReadError),
        }
    }

    pub(super) fn raw_peek(&mut self) -> Result<Option<u8>, Error> {
        if self.lookahead.is_none() {
            self.lookahead = self.raw_read()?;
        }
        Ok(self.lookahead)
    }

    /// Discard everything the connection has ready.
    pub(super) fn flush_rx(&mut self) -> Result<(), Error> {
        while self.raw_available() > 0 {
            if self.raw_read()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Poll `step` until it yields a byte or the idle gap runs out.
    pub(super) fn wait_for<F>(&mut self, mut step: F) -> Result<u8, Error>
    where
        F: FnMut(&mut Self) -> Result<Option<u8>, Error>,
    {
        let since = self.clock.now_ms();
        loop {
            if let Some(byte) = step(self)? {
                return Ok(byte);
            }
            if self.idle_expired(since) {
                warn!("no data for {} ms", self.config.response_timeout_ms);
                return Err(Error::Timeout);
            }
            self.clock.delay_ms(self.config.poll_interval_ms);
        }
    }

    pub(super) fn idle_expired(&mut self, since: u64) -> bool {
        self.clock.now_ms().saturating_sub(since) >= u64::from(self.config.response_timeout_ms)
    }

    pub(super) fn pause(&mut self) {
        self.clock.delay_ms(self.config.poll_interval_ms);
    }
}

impl<C, K> fmt::Debug for Client<C, K>
where
    C: Connection + Available,
    K: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("status_code", &self.status_code)
            .field("content_length", &self.content_length)
            .field("is_chunked", &self.is_chunked)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Adapter that formats straight onto the connection.
struct Wire<'a, W: Write> {
    connection: &'a mut W,
    error: Option<Error>,
}

impl<W: Write> fmt::Write for Wire<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        write_all(self.connection, s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}

fn write_all<W: Write>(connection: &mut W, mut data: &[u8]) -> Result<(), Error> {
    while !data.is_empty() {
        match connection.write(data) {
            Ok(0) => return Err(Error::ShortWrite),
            Ok(n) => data = &data[n..],
            Err(_) => return Err(Error::WriteError),
        }
    }
    Ok(())
}
