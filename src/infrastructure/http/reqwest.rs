//! Blocking reqwest transport adapter

use std::error::Error as StdError;

use crate::application::ports::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

/// HTTP transport backed by a blocking reqwest client.
///
/// The client is cheap to clone; the status poller and the upload pipeline
/// each hold a clone sharing one connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Map a reqwest failure onto the transport taxonomy
    fn classify(error: &reqwest::Error, has_body: bool) -> TransportError {
        if error.is_builder() {
            return TransportError::InvalidUrl(error.to_string());
        }
        if error.is_timeout() {
            return TransportError::ReadTimeout;
        }
        if error.is_connect() {
            if Self::is_dns_failure(error) {
                return TransportError::InvalidUrl(error.to_string());
            }
            return TransportError::ConnectionRefused;
        }
        if error.is_decode() {
            return TransportError::Encoding;
        }
        if error.is_body() {
            return TransportError::StreamWrite;
        }
        if error.is_request() {
            return if has_body {
                TransportError::SendPayloadFailed
            } else {
                TransportError::SendHeaderFailed
            };
        }
        TransportError::ConnectionLost
    }

    fn is_dns_failure(error: &reqwest::Error) -> bool {
        let mut source = error.source();
        while let Some(cause) = source {
            if cause.to_string().to_lowercase().contains("dns") {
                return true;
            }
            source = cause.source();
        }
        false
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        let has_body = !request.body.is_empty();

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url).body(request.body.to_vec()),
        };
        builder = builder.timeout(request.timeout.as_std());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .map_err(|e| Self::classify(&e, has_body))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Self::classify(&e, false))?;

        Ok(HttpResponse { status, body })
    }
}
