//! Response parsing: status line, headers and body.
//!
//! Every byte is pulled from the connection individually and fed through the
//! [`State`] machine. The parser never holds more than the current header line,
//! which is what lets it run on devices with a few kilobytes of RAM.

use super::chunk::{ChunkState, Step};
use super::client::Client;
use super::state::State;
use crate::network::error::Error;
use crate::network::{Available, Clock, Connection};
use heapless::{String, Vec};

/// Expected start of a status line; `*` stands for a single digit.
const STATUS_PREFIX: &[u8] = b"HTTP/*.* ";

const CONTENT_LENGTH_PREFIX: &[u8] = b"content-length:";
const CHUNKED_HEADER: &[u8] = b"transfer-encoding: chunked";

/// Cursor value of a header prefix that can no longer match on this line.
const NO_MATCH: usize = usize::MAX;

fn matches_at(pattern: &[u8], cursor: usize, byte: u8) -> bool {
    pattern
        .get(cursor)
        .is_some_and(|expected| expected.eq_ignore_ascii_case(&byte))
}

fn advance(pattern: &[u8], cursor: usize, byte: u8) -> usize {
    if matches_at(pattern, cursor, byte) {
        cursor + 1
    } else {
        NO_MATCH
    }
}

fn is_informational(status: u16) -> bool {
    (100..200).contains(&status) && status != 101
}

impl<C, K> Client<C, K>
where
    C: Connection + Available,
    K: Clock,
{
    /// Read the status line of the response and return its status code.
    ///
    /// Interim `1xx` responses (other than `101 Switching Protocols`) are
    /// skipped together with their headers, so the first final status is
    /// returned. Any HTTP status is a valid result; only engine failures are
    /// errors.
    ///
    /// # Errors
    ///
    /// * [`Error::ApiMisuse`] - The request has not been sent yet
    /// * [`Error::InvalidResponse`] - The line does not start with `HTTP/x.y `
    /// * [`Error::Timeout`] - No byte arrived within the response timeout
    pub fn response_status_code(&mut self) -> Result<u16, Error> {
        if !self.state.request_sent() {
            return Err(Error::ApiMisuse);
        }

        loop {
            self.status_code = 0;
            self.state = State::RequestSent;
            self.read_status_line()?;

            if is_informational(self.status_code) {
                debug!("skipping informational status {}", self.status_code);
                self.skip_interim_headers()?;
                continue;
            }
            if self.status_code < 100 {
                return Err(Error::InvalidResponse);
            }

            self.content_length_cursor = 0;
            self.chunked_cursor = 0;
            debug!("status {}", self.status_code);
            return Ok(self.status_code);
        }
    }

    fn read_status_line(&mut self) -> Result<(), Error> {
        let mut matched = 0;
        loop {
            let byte = self.wait_for(Self::read)?;
            match self.state {
                State::RequestSent => {
                    if matched == 0 && (byte == b'\r' || byte == b'\n') {
                        // blank line left over from an interim response
                        continue;
                    }
                    let expected = STATUS_PREFIX[matched];
                    let accepted = if expected == b'*' {
                        byte.is_ascii_digit()
                    } else {
                        byte == expected
                    };
                    if !accepted {
                        return Err(Error::InvalidResponse);
                    }
                    matched += 1;
                    if matched == STATUS_PREFIX.len() {
                        self.state = State::ReadingStatusCode;
                    }
                }
                State::ReadingStatusCode => {
                    if byte.is_ascii_digit() {
                        self.status_code = self
                            .status_code
                            .saturating_mul(10)
                            .saturating_add(u16::from(byte - b'0'));
                    } else {
                        self.state = State::StatusCodeRead;
                    }
                }
                _ => {}
            }

            if byte == b'\n' {
                return if self.state == State::StatusCodeRead {
                    Ok(())
                } else {
                    Err(Error::InvalidResponse)
                };
            }
        }
    }

    fn skip_interim_headers(&mut self) -> Result<(), Error> {
        let mut line_len = 0;
        loop {
            match self.wait_for(Self::read)? {
                b'\n' if line_len == 0 => return Ok(()),
                b'\n' => line_len = 0,
                b'\r' => {}
                _ => line_len += 1,
            }
        }
    }

    fn expect_status_read(&self) -> Result<(), Error> {
        if self.state >= State::StatusCodeRead {
            Ok(())
        } else {
            Err(Error::ApiMisuse)
        }
    }

    /// Read one header byte and advance the header state machine.
    ///
    /// While the bytes go by, the `Content-Length` value and a
    /// `Transfer-Encoding: chunked` header are picked up, and the blank line
    /// that ends the headers switches the client into body mode. Once the
    /// headers are done this behaves like [`read`](Self::read).
    fn read_header(&mut self) -> Result<Option<u8>, Error> {
        let Some(byte) = self.read()? else {
            return Ok(None);
        };

        if self.state.end_of_headers() {
            return Ok(Some(byte));
        }

        match self.state {
            State::StatusCodeRead => {
                if byte == b'\r' && self.content_length_cursor == 0 && self.chunked_cursor == 0 {
                    self.state = State::LineStartingCrFound;
                } else {
                    self.content_length_cursor =
                        advance(CONTENT_LENGTH_PREFIX, self.content_length_cursor, byte);
                    self.chunked_cursor = advance(CHUNKED_HEADER, self.chunked_cursor, byte);

                    if self.content_length_cursor == CONTENT_LENGTH_PREFIX.len() {
                        self.state = State::ReadingContentLength;
                        // the last Content-Length header wins
                        self.content_length = Some(0);
                        self.body_consumed = 0;
                    } else if self.chunked_cursor == CHUNKED_HEADER.len() {
                        self.is_chunked = true;
                        self.state = State::SkipToEndOfHeader;
                    } else if self.content_length_cursor == NO_MATCH
                        && self.chunked_cursor == NO_MATCH
                    {
                        self.state = State::SkipToEndOfHeader;
                    }
                }
            }
            State::ReadingContentLength => {
                if byte.is_ascii_digit() {
                    let digit = usize::from(byte - b'0');
                    self.content_length = self
                        .content_length
                        .map(|len| len.saturating_mul(10).saturating_add(digit));
                } else if byte != b' ' && byte != b'\t' {
                    self.state = State::SkipToEndOfHeader;
                }
            }
            State::LineStartingCrFound => {
                if byte == b'\n' {
                    if self.is_chunked {
                        debug!("end of headers, chunked body");
                        self.chunk = ChunkState::default();
                        self.state = State::ReadingChunkLength;
                    } else {
                        match self.content_length {
                            Some(len) => debug!("end of headers, body of {} bytes", len),
                            None => debug!("end of headers, body length unknown"),
                        }
                        self.state = State::ReadingBody;
                    }
                }
            }
            _ => {}
        }

        if byte == b'\n' && !self.state.end_of_headers() {
            self.state = State::StatusCodeRead;
            self.content_length_cursor = 0;
            self.chunked_cursor = 0;
        }

        Ok(Some(byte))
    }

    /// Read and discard the remaining response headers.
    ///
    /// # Errors
    ///
    /// * [`Error::ApiMisuse`] - The status line has not been read yet
    /// * [`Error::Timeout`] - The headers did not finish within the response timeout
    pub fn skip_response_headers(&mut self) -> Result<(), Error> {
        self.expect_status_read()?;
        while !self.state.end_of_headers() {
            self.wait_for(Self::read_header)?;
        }
        Ok(())
    }

    /// Read the next header line.
    ///
    /// Returns `Ok(true)` when a line is available through
    /// [`read_header_name`](Self::read_header_name) and
    /// [`read_header_value`](Self::read_header_value), and `Ok(false)` once
    /// the end of the headers has been reached. Lines longer than
    /// [`HEADER_LINE_CAPACITY`](super::HEADER_LINE_CAPACITY) are truncated.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// while client.header_available()? {
    ///     if client.read_header_name().eq_ignore_ascii_case("Content-Type") {
    ///         let content_type = client.read_header_value();
    ///     }
    /// }
    /// ```
    pub fn header_available(&mut self) -> Result<bool, Error> {
        self.expect_status_read()?;
        self.header_line.clear();

        while !self.state.end_of_headers() {
            let byte = self.wait_for(Self::read_header)?;
            if byte == b'\r' || byte == b'\n' {
                if self.header_line.is_empty() {
                    continue;
                }
                break;
            }
            // full line: keep the prefix
            let _ = self.header_line.push(byte as char);
        }

        Ok(!self.header_line.is_empty())
    }

    /// Name of the header line read by [`header_available`](Self::header_available).
    pub fn read_header_name(&self) -> &str {
        let line = self.header_line.as_str();
        match line.find(':') {
            Some(colon) => &line[..colon],
            None => "",
        }
    }

    /// Value of the header line read by [`header_available`](Self::header_available),
    /// without the whitespace after the colon.
    pub fn read_header_value(&self) -> &str {
        let line = self.header_line.as_str();
        match line.find(':') {
            Some(colon) => line[colon + 1..].trim_start(),
            None => "",
        }
    }

    /// The status code parsed by [`response_status_code`](Self::response_status_code), or 0.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Whether all response headers have been consumed.
    pub fn end_of_headers_reached(&self) -> bool {
        self.state.end_of_headers()
    }

    /// Whether the response uses `Transfer-Encoding: chunked`.
    pub fn is_response_chunked(&self) -> bool {
        self.is_chunked
    }

    /// The announced body length, reading past any unread headers first.
    ///
    /// `Ok(None)` means the response carries no `Content-Length` header.
    pub fn content_length(&mut self) -> Result<Option<usize>, Error> {
        if !self.state.end_of_headers() {
            self.skip_response_headers()?;
        }
        Ok(self.content_length)
    }

    /// Whether the whole body has been read.
    ///
    /// Only known for bodies with a `Content-Length` header (all announced
    /// bytes read) and chunked bodies (final chunk seen). For anything else
    /// the end is only visible as [`read`](Self::read) returning `None`.
    pub fn end_of_body_reached(&self) -> bool {
        if !self.state.end_of_headers() {
            return false;
        }
        if self.is_chunked {
            return self.chunk.is_last();
        }
        match self.content_length {
            Some(len) => self.body_consumed >= len,
            None => false,
        }
    }

    /// Read the complete response body.
    ///
    /// With a `Content-Length` header exactly that many bytes are read.
    /// Without one, bytes are collected until the final chunk (chunked bodies)
    /// or until the connection stays silent for the response timeout.
    ///
    /// # Errors
    ///
    /// * [`Error::BufferOverflow`] - The body does not fit into `N` bytes
    /// * [`Error::IncompleteBody`] - Fewer bytes arrived than announced
    /// * [`Error::Timeout`] - The headers did not finish in time
    pub fn response_body<const N: usize>(&mut self) -> Result<Vec<u8, N>, Error> {
        let length = self.content_length()?;
        if length.is_some_and(|len| len > N) {
            return Err(Error::BufferOverflow);
        }

        let mut body = Vec::new();
        while let Some(byte) = self.timed_read()? {
            body.push(byte).map_err(|_| Error::BufferOverflow)?;
        }

        if length.is_some_and(|len| body.len() != len) {
            warn!("body ended after {} bytes", body.len());
            return Err(Error::IncompleteBody);
        }
        Ok(body)
    }

    /// [`response_body`](Self::response_body) as UTF-8 text.
    pub fn response_body_str<const N: usize>(&mut self) -> Result<String<N>, Error> {
        String::from_utf8(self.response_body::<N>()?).map_err(|_| Error::Utf8)
    }

    /// Number of body bytes that can be read right now.
    ///
    /// For chunked bodies this parses pending chunk-size lines and never
    /// reports more than what is left of the current chunk; it is 0 while a
    /// size line is still incomplete.
    pub fn available(&mut self) -> Result<usize, Error> {
        if self.state == State::ReadingChunkLength {
            self.read_chunk_size()?;
        }

        if self.state == State::ReadingBodyChunk && self.chunk.remaining == 0 {
            self.state = State::ReadingChunkLength;
        }

        let ready = match self.state {
            State::ReadingChunkLength => 0,
            State::ReadingBodyChunk => self.raw_available().min(self.chunk.remaining),
            _ => self.raw_available(),
        };
        Ok(ready)
    }

    fn read_chunk_size(&mut self) -> Result<(), Error> {
        while !self.chunk.is_last() && self.raw_available() > 0 {
            let Some(byte) = self.raw_read()? else {
                break;
            };
            match self.chunk.feed(byte) {
                Step::Data => {
                    trace!("chunk of {} bytes", self.chunk.remaining);
                    self.state = State::ReadingBodyChunk;
                    break;
                }
                Step::Finished => {
                    debug!("last chunk read");
                    break;
                }
                Step::Pending => {}
            }
        }
        Ok(())
    }

    /// Read one byte without waiting.
    ///
    /// `Ok(None)` means nothing is ready, or the chunked body has ended.
    pub fn read(&mut self) -> Result<Option<u8>, Error> {
        if self.is_chunked && self.state.end_of_headers() && self.available()? == 0 {
            return Ok(None);
        }

        let Some(byte) = self.raw_read()? else {
            return Ok(None);
        };

        if self.state.end_of_headers() && self.content_length.is_some_and(|len| len > 0) {
            self.body_consumed += 1;
        }

        if self.state == State::ReadingBodyChunk {
            self.chunk.remaining = self.chunk.remaining.saturating_sub(1);
            if self.chunk.remaining == 0 {
                self.state = State::ReadingChunkLength;
            }
        }

        Ok(Some(byte))
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>, Error> {
        if self.is_chunked && self.state.end_of_headers() && self.available()? == 0 {
            return Ok(None);
        }
        self.raw_peek()
    }

    /// Fill `buf` from the body, waiting up to the response timeout per byte.
    ///
    /// Returns the number of bytes read, which is short when the body ends
    /// or the connection goes quiet.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.timed_read()? {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    /// Wait for the next body byte; `None` at the end of the body or on timeout.
    fn timed_read(&mut self) -> Result<Option<u8>, Error> {
        let since = self.clock.now_ms();
        loop {
            if self.end_of_body_reached() {
                return Ok(None);
            }
            if let Some(byte) = self.read()? {
                return Ok(Some(byte));
            }
            if self.end_of_body_reached() || self.idle_expired(since) {
                return Ok(None);
            }
            self.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_informational_range() {
        assert!(is_informational(100));
        assert!(is_informational(103));
        assert!(!is_informational(101));
        assert!(!is_informational(200));
        assert!(!is_informational(99));
    }

    #[test]
    fn test_header_prefix_is_case_insensitive() {
        assert!(matches_at(CONTENT_LENGTH_PREFIX, 0, b'C'));
        assert!(matches_at(CONTENT_LENGTH_PREFIX, 0, b'c'));
        assert!(matches_at(CHUNKED_HEADER, 9, b'E'));
        assert!(!matches_at(CONTENT_LENGTH_PREFIX, CONTENT_LENGTH_PREFIX.len(), b':'));
        assert!(!matches_at(CONTENT_LENGTH_PREFIX, NO_MATCH, b'c'));
    }

    #[test]
    fn test_prefixes_are_matched_independently() {
        let mut length = 0;
        let mut chunked = 0;
        for &byte in b"Transfer-Encoding: chunked" {
            length = advance(CONTENT_LENGTH_PREFIX, length, byte);
            chunked = advance(CHUNKED_HEADER, chunked, byte);
        }
        assert_eq!(length, NO_MATCH);
        assert_eq!(chunked, CHUNKED_HEADER.len());
    }
}
