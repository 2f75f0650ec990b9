//! Common error types for network operations

use core::fmt;

/// A common error type for network operations.
///
/// This enum defines every error the HTTP and WebSocket clients can report.
/// It is designed to be simple and portable for `no_std` environments: it is
/// `Copy`, carries no heap data and can be formatted with `defmt`.
///
/// Ordinary HTTP status codes such as `404` are not errors; they are returned
/// as values from [`response_status_code`](crate::network::application::http::Client::response_status_code).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on a connection that is not open.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// No byte arrived within the configured response timeout.
    Timeout,
    /// The connection was closed.
    ConnectionClosed,
    /// A protocol-specific error occurred.
    ProtocolError,
    /// An operation was invoked in the wrong phase of the request cycle,
    /// e.g. reading the status code before the request was sent.
    ApiMisuse,
    /// The peer sent bytes that do not match the expected grammar.
    InvalidResponse,
    /// A fixed-capacity buffer was too small for the data.
    BufferOverflow,
    /// Fewer body bytes arrived than the `Content-Length` header announced.
    IncompleteBody,
    /// A WebSocket message is already being assembled.
    TxInProgress,
    /// No WebSocket message has been started with `begin_message`.
    TxNotStarted,
    /// The transport accepted fewer bytes than were handed to it.
    ShortWrite,
    /// The server answered with a status other than the one expected.
    UnexpectedStatus(u16),
    /// Text data was not valid UTF-8.
    Utf8,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotOpen => f.write_str("connection is not open"),
            Error::WriteError => f.write_str("write failed"),
            Error::ReadError => f.write_str("read failed"),
            Error::Timeout => f.write_str("timed out waiting for data"),
            Error::ConnectionClosed => f.write_str("connection closed"),
            Error::ProtocolError => f.write_str("protocol error"),
            Error::ApiMisuse => f.write_str("operation not valid in the current state"),
            Error::InvalidResponse => f.write_str("invalid response"),
            Error::BufferOverflow => f.write_str("buffer too small"),
            Error::IncompleteBody => f.write_str("response body shorter than content-length"),
            Error::TxInProgress => f.write_str("message already in progress"),
            Error::TxNotStarted => f.write_str("no message in progress"),
            Error::ShortWrite => f.write_str("short write"),
            Error::UnexpectedStatus(code) => write!(f, "unexpected status code {}", code),
            Error::Utf8 => f.write_str("invalid utf-8"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::ApiMisuse => defmt::write!(f, "ApiMisuse"),
            Error::InvalidResponse => defmt::write!(f, "InvalidResponse"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::IncompleteBody => defmt::write!(f, "IncompleteBody"),
            Error::TxInProgress => defmt::write!(f, "TxInProgress"),
            Error::TxNotStarted => defmt::write!(f, "TxNotStarted"),
            Error::ShortWrite => defmt::write!(f, "ShortWrite"),
            Error::UnexpectedStatus(code) => defmt::write!(f, "UnexpectedStatus({=u16})", code),
            Error::Utf8 => defmt::write!(f, "Utf8"),
        }
    }
}
