//! Result taxonomy.
//!
//! Every remote operation resolves to exactly one [`Outcome`], decided by
//! [`classify`]. The mapping is fixed:
//!
//! | Exchange | Outcome |
//! |----------|---------|
//! | no response / unreadable body | `TransportFailure(cause)` |
//! | 200, payload decodes | `Success(payload)` |
//! | 200, payload does not decode | `TransportFailure(Decode)` |
//! | 400 | `Error { reason }` |
//! | 403 | `InvalidPermission(required)` |
//! | 404 | `NotFound` |
//! | anything else | `UnexpectedError` |
//!
//! Operations vary only the payload decoder and the permission attached
//! to a 403. [`Outcome::IdentityDrift`] is never produced by
//! [`classify`]; the refresh protocol raises it after a successful fetch.

use crate::transport::{RawResponse, TransportError};
use crate::ClientError;
use sadstate_auth::RequiredPermission;
use sadstate_types::{CanonicalId, ErrorCode};
use serde::Serialize;
use thiserror::Error;

/// Reason attached to a 400 with an empty body.
pub const DEFAULT_ERROR_REASON: &str = "invalid input";

/// Semantic outcome of one remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    /// Status 400. The reason is the response body, or "invalid input".
    Error { reason: String },
    /// Status 403, carrying the permission the operation required.
    InvalidPermission(RequiredPermission),
    /// Status 404.
    NotFound,
    /// Any status outside the table.
    UnexpectedError,
    /// A refresh by name returned a different remote object.
    IdentityDrift {
        expected: CanonicalId,
        found: CanonicalId,
    },
    TransportFailure(ClientError),
}

impl<T> Outcome<T> {
    /// Short label, stable across releases (used in CLI output and logs).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Error { .. } => "error",
            Self::InvalidPermission(_) => "invalid_permission",
            Self::NotFound => "not_found",
            Self::UnexpectedError => "unexpected_error",
            Self::IdentityDrift { .. } => "identity_drift",
            Self::TransportFailure(_) => "transport_failure",
        }
    }

    /// Splits off the success payload; any other variant is re-typed.
    fn split<U>(self) -> Result<T, Outcome<U>> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Error { reason } => Err(Outcome::Error { reason }),
            Self::InvalidPermission(p) => Err(Outcome::InvalidPermission(p)),
            Self::NotFound => Err(Outcome::NotFound),
            Self::UnexpectedError => Err(Outcome::UnexpectedError),
            Self::IdentityDrift { expected, found } => {
                Err(Outcome::IdentityDrift { expected, found })
            }
            Self::TransportFailure(e) => Err(Outcome::TransportFailure(e)),
        }
    }
}

/// An [`Outcome`] plus the raw exchange it was derived from.
///
/// `status` and `body` are empty when no response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    pub status: Option<u16>,
    pub body: Vec<u8>,
    pub outcome: Outcome<T>,
}

impl<T> Response<T> {
    /// A response that never reached the server.
    #[must_use]
    pub fn failure(cause: ClientError) -> Self {
        Self {
            status: None,
            body: Vec::new(),
            outcome: Outcome::TransportFailure(cause),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Borrows the success payload.
    #[must_use]
    pub fn success(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Transforms the success payload, keeping status and body.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            body: self.body,
            outcome: match self.outcome.split() {
                Ok(v) => Outcome::Success(f(v)),
                Err(other) => other,
            },
        }
    }

    /// Replaces a success with whatever `f` decides, keeping status and body.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Response<U> {
        let outcome = match self.outcome.split() {
            Ok(v) => f(v),
            Err(other) => other,
        };
        Response {
            status: self.status,
            body: self.body,
            outcome,
        }
    }

    /// Converts to a `Result` for `?`-style callers.
    ///
    /// # Errors
    ///
    /// Returns the [`ResponseError`] mirroring any non-success outcome.
    pub fn into_result(self) -> Result<T, ResponseError> {
        match self.outcome {
            Outcome::Success(v) => Ok(v),
            Outcome::Error { reason } => Err(ResponseError::Input { reason }),
            Outcome::InvalidPermission(required) => {
                Err(ResponseError::PermissionDenied { required })
            }
            Outcome::NotFound => Err(ResponseError::NotFound),
            Outcome::UnexpectedError => Err(ResponseError::UnexpectedStatus {
                status: self.status.unwrap_or_default(),
            }),
            Outcome::IdentityDrift { expected, found } => {
                Err(ResponseError::IdentityDrift { expected, found })
            }
            Outcome::TransportFailure(cause) => Err(ResponseError::Transport(cause)),
        }
    }
}

/// Serializable summary of a response, for logs and CLI output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseSummary {
    pub status: Option<u16>,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<T> From<&Response<T>> for ResponseSummary {
    fn from(response: &Response<T>) -> Self {
        let detail = match &response.outcome {
            Outcome::Success(_) | Outcome::NotFound | Outcome::UnexpectedError => None,
            Outcome::Error { reason } => Some(reason.clone()),
            Outcome::InvalidPermission(required) => Some(required.to_string()),
            Outcome::IdentityDrift { expected, found } => {
                Some(format!("expected {expected}, found {found}"))
            }
            Outcome::TransportFailure(cause) => Some(cause.to_string()),
        };
        Self {
            status: response.status,
            outcome: response.outcome.kind(),
            detail,
        }
    }
}

/// Non-success outcome as an error value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("invalid input: {reason}")]
    Input { reason: String },

    #[error("permission denied: requires {required}")]
    PermissionDenied { required: RequiredPermission },

    #[error("not found")]
    NotFound,

    #[error("unexpected status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("identity drift: expected {expected}, found {found}")]
    IdentityDrift {
        expected: CanonicalId,
        found: CanonicalId,
    },

    #[error(transparent)]
    Transport(ClientError),
}

impl ErrorCode for ResponseError {
    fn code(&self) -> &'static str {
        match self {
            Self::Input { .. } => "RESPONSE_INPUT",
            Self::PermissionDenied { .. } => "RESPONSE_PERMISSION_DENIED",
            Self::NotFound => "RESPONSE_NOT_FOUND",
            Self::UnexpectedStatus { .. } => "RESPONSE_UNEXPECTED_STATUS",
            Self::IdentityDrift { .. } => "RESPONSE_IDENTITY_DRIFT",
            Self::Transport(_) => "RESPONSE_TRANSPORT",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Input { .. } => true,
            Self::Transport(cause) => cause.is_recoverable(),
            _ => false,
        }
    }
}

/// Classifies one exchange.
///
/// `decode` only runs for status 200; its error becomes a
/// `TransportFailure`.
pub fn classify<T>(
    exchange: Result<RawResponse, TransportError>,
    required: RequiredPermission,
    decode: impl FnOnce(&[u8]) -> Result<T, ClientError>,
) -> Response<T> {
    let raw = match exchange {
        Ok(raw) => raw,
        Err(e) => return Response::failure(ClientError::Transport(e)),
    };

    let outcome = match raw.status {
        200 => match decode(&raw.body) {
            Ok(payload) => Outcome::Success(payload),
            Err(e) => Outcome::TransportFailure(e),
        },
        400 => {
            let text = raw.text();
            let reason = if text.trim().is_empty() {
                DEFAULT_ERROR_REASON.to_string()
            } else {
                text
            };
            Outcome::Error { reason }
        }
        403 => Outcome::InvalidPermission(required),
        404 => Outcome::NotFound,
        _ => Outcome::UnexpectedError,
    };

    Response {
        status: Some(raw.status),
        body: raw.body,
        outcome,
    }
}
