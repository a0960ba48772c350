//! Transport seam.
//!
//! The session never talks to the network directly. It hands a
//! [`Request`] to a [`Transport`] and gets back either a
//! [`RawResponse`] (any status code, including 4xx/5xx) or a
//! [`TransportError`] when no response was received at all.
//!
//! ```text
//! Session ──Request──▶ Transport ──▶ (status, body) | TransportError
//!                        │
//!                        ├── HttpTransport      (ureq, production)
//!                        └── ScriptedTransport  (testing)
//! ```

mod http;

pub use http::HttpTransport;

use crate::multipart::MultipartForm;
use sadstate_types::ErrorCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// HTTP method used by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A fully-built outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Bodyless GET.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Bodyless DELETE.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            ..Self::get(url)
        }
    }

    /// POST with an empty body (all arguments in the query string).
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    /// POST carrying a `multipart/form-data` body.
    #[must_use]
    pub fn post_form(url: impl Into<String>, form: &MultipartForm) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(form.encode()),
            headers: vec![("Content-Type".to_string(), form.content_type())],
        }
    }

    /// Returns the value of the first header named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and body of a received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Timeout,
    Dns,
    ConnectionRefused,
    ConnectionReset,
    Tls,
    InvalidUrl,
    /// The response started but its body could not be read.
    Body,
    Network,
}

impl TransportErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Dns => "dns",
            Self::ConnectionRefused => "connection_refused",
            Self::ConnectionReset => "connection_reset",
            Self::Tls => "tls",
            Self::InvalidUrl => "invalid_url",
            Self::Body => "body",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// No response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self.kind {
            TransportErrorKind::Timeout => "TRANSPORT_TIMEOUT",
            TransportErrorKind::Dns => "TRANSPORT_DNS",
            TransportErrorKind::ConnectionRefused => "TRANSPORT_CONNECTION_REFUSED",
            TransportErrorKind::ConnectionReset => "TRANSPORT_CONNECTION_RESET",
            TransportErrorKind::Tls => "TRANSPORT_TLS",
            TransportErrorKind::InvalidUrl => "TRANSPORT_INVALID_URL",
            TransportErrorKind::Body => "TRANSPORT_BODY",
            TransportErrorKind::Network => "TRANSPORT_NETWORK",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Timeout
                | TransportErrorKind::ConnectionReset
                | TransportErrorKind::Network
        )
    }
}

/// Sends one request and waits for the full response.
///
/// Implementations block the calling thread until the response body has
/// been read or the request failed. A status code outside 2xx is a
/// successful exchange, not an error.
pub trait Transport: Send + Sync {
    /// Sends `request`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no response was obtained.
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;
}
