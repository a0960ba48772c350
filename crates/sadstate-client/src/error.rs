//! Client-side failure causes.
//!
//! [`ClientError`] is what an [`Outcome::TransportFailure`](crate::Outcome)
//! carries: anything that prevented a well-formed response from being
//! interpreted. Status-code outcomes (400/403/404/...) are not errors at
//! this level; they are regular [`Outcome`](crate::Outcome) variants.

use crate::transport::TransportError;
use sadstate_types::{ErrorCode, IdError};
use thiserror::Error;

/// Why a remote call could not produce a classified response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// No response was received.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// A 200 body could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Request body could not be built.
    #[error("encode failed: {0}")]
    Encode(String),

    /// A decoded body lacks a required field or has the wrong shape.
    #[error("malformed payload: field '{field}': {reason}")]
    MalformedPayload { field: String, reason: String },

    /// An identifier in the payload could not be decoded.
    #[error("identifier: {0}")]
    Identifier(#[from] IdError),

    /// The session that issued an entity handle was dropped.
    #[error("session closed")]
    SessionClosed,
}

impl ClientError {
    pub(crate) fn malformed(field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for ClientError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "CLIENT_TRANSPORT",
            Self::Decode(_) => "CLIENT_DECODE",
            Self::Encode(_) => "CLIENT_ENCODE",
            Self::MalformedPayload { .. } => "CLIENT_MALFORMED_PAYLOAD",
            Self::Identifier(_) => "CLIENT_IDENTIFIER",
            Self::SessionClosed => "CLIENT_SESSION_CLOSED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            _ => false,
        }
    }
}
