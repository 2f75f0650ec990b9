//! Phases of a single request/response exchange.

/// The phase the connection is in.
///
/// Phases only move forward during an exchange, so the derived ordering is
/// meaningful: everything from [`State::ReadingBody`] on means the response
/// headers have been consumed, and everything from [`State::RequestSent`] on
/// means a response may be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Nothing has been sent yet.
    #[default]
    Idle,
    /// The request line is out, headers may still be added.
    RequestStarted,
    /// Headers are terminated; the response can be read.
    RequestSent,
    /// The `HTTP/x.y ` prefix matched, status digits are being read.
    ReadingStatusCode,
    /// At the start of a header line (or inside one being matched).
    StatusCodeRead,
    /// Inside the value of a `Content-Length` header.
    ReadingContentLength,
    /// Ignoring the rest of the current header line.
    SkipToEndOfHeader,
    /// A `\r` started a line; a `\n` ends the headers.
    LineStartingCrFound,
    /// Reading a body that is not chunked (or a WebSocket stream).
    ReadingBody,
    /// Reading a chunk-size line.
    ReadingChunkLength,
    /// Reading the payload of a chunk.
    ReadingBodyChunk,
}

impl State {
    /// Whether the response headers have been fully consumed.
    pub fn end_of_headers(self) -> bool {
        self >= State::ReadingBody
    }

    /// Whether a response (or part of it) may be read in this phase.
    pub fn request_sent(self) -> bool {
        self >= State::RequestSent
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for State {
    fn format(&self, f: defmt::Formatter) {
        match self {
            State::Idle => defmt::write!(f, "Idle"),
            State::RequestStarted => defmt::write!(f, "RequestStarted"),
            State::RequestSent => defmt::write!(f, "RequestSent"),
            State::ReadingStatusCode => defmt::write!(f, "ReadingStatusCode"),
            State::StatusCodeRead => defmt::write!(f, "StatusCodeRead"),
            State::ReadingContentLength => defmt::write!(f, "ReadingContentLength"),
            State::SkipToEndOfHeader => defmt::write!(f, "SkipToEndOfHeader"),
            State::LineStartingCrFound => defmt::write!(f, "LineStartingCrFound"),
            State::ReadingBody => defmt::write!(f, "ReadingBody"),
            State::ReadingChunkLength => defmt::write!(f, "ReadingChunkLength"),
            State::ReadingBodyChunk => defmt::write!(f, "ReadingBodyChunk"),
        }
    }
}
