//! HTTP transport port interface

use thiserror::Error;

use crate::domain::recording::Duration;

/// Transport-level failures.
///
/// Each variant carries a stable negative code so failures can be
/// reported alongside HTTP status codes in a single numeric field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection refused")]
    ConnectionRefused,

    #[error("failed to send request headers")]
    SendHeaderFailed,

    #[error("failed to send request payload")]
    SendPayloadFailed,

    #[error("not connected")]
    NotConnected,

    #[error("connection lost")]
    ConnectionLost,

    #[error("no response stream")]
    NoStream,

    #[error("peer is not an HTTP server")]
    NoHttpServer,

    #[error("out of memory")]
    OutOfMemory,

    #[error("transfer encoding error")]
    Encoding,

    #[error("stream I/O error")]
    StreamWrite,

    #[error("read timeout")]
    ReadTimeout,

    #[error("invalid URL or host lookup failed: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Stable negative code for this failure
    pub const fn code(&self) -> i32 {
        match self {
            Self::ConnectionRefused => -1,
            Self::SendHeaderFailed => -2,
            Self::SendPayloadFailed => -3,
            Self::NotConnected => -4,
            Self::ConnectionLost => -5,
            Self::NoStream => -6,
            Self::NoHttpServer => -7,
            Self::OutOfMemory => -8,
            Self::Encoding => -9,
            Self::StreamWrite => -10,
            Self::ReadTimeout => -11,
            Self::InvalidUrl(_) => -12,
        }
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound request. The body is borrowed from the session buffer.
#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: &'a [u8],
    pub timeout: Duration,
}

impl<'a> HttpRequest<'a> {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: &[],
            timeout,
        }
    }

    pub fn post(url: impl Into<String>, body: &'a [u8], timeout: Duration) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((name.into(), value.to_string()));
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Port for the HTTP transport primitive
pub trait HttpTransport {
    /// Perform one request/response exchange.
    ///
    /// Any HTTP status is a successful exchange; only failures to complete
    /// the exchange are errors.
    fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
