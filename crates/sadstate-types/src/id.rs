//! Identifier types and the opaque identifier codec.
//!
//! The server hands out identifiers as opaque, transport-safe tokens
//! (standard base64 with padding). Internally every identifier is a
//! [`CanonicalId`]: a signed 64-bit integer that is cheap to hash and
//! compare, and that keys the entity caches.
//!
//! # Byte Order
//!
//! The decoded bytes are read as a **big-endian two's-complement**
//! integer:
//!
//! - more than 8 bytes: only the low-order 8 bytes are kept
//! - fewer than 8 bytes: the value is sign-extended
//! - zero bytes: rejected with [`IdError::Empty`]
//!
//! ```text
//! "AQI="  ──base64──▶  [0x01, 0x02]  ──be/i64──▶  258
//! "/w=="  ──base64──▶  [0xFF]        ──be/i64──▶  -1
//! ```
//!
//! [`CanonicalId::to_opaque`] is the exact inverse for every `i64`.
//!
//! # Example
//!
//! ```
//! use sadstate_types::CanonicalId;
//!
//! let id = CanonicalId::from_opaque("AQI=").unwrap();
//! assert_eq!(id.get(), 258);
//! assert_eq!(id.to_opaque(), "AQI=");
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ErrorCode;

/// Errors produced while converting identifiers from their wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The token is not valid standard base64.
    #[error("identifier '{input}' is not valid base64: {reason}")]
    Base64 { input: String, reason: String },

    /// The token decoded to zero bytes.
    #[error("identifier decodes to an empty byte sequence")]
    Empty,

    /// An auth ticket was not a decimal integer.
    #[error("auth ticket '{input}' is not a decimal integer")]
    TicketFormat { input: String },

    /// An auth ticket of zero is the unauthenticated sentinel.
    #[error("auth ticket must be non-zero")]
    ZeroTicket,

    /// A permission-table key was not a decimal integer.
    #[error("peer id '{input}' is not a decimal integer")]
    PeerFormat { input: String },
}

impl ErrorCode for IdError {
    fn code(&self) -> &'static str {
        match self {
            Self::Base64 { .. } => "ID_BASE64",
            Self::Empty => "ID_EMPTY",
            Self::TicketFormat { .. } => "ID_TICKET_FORMAT",
            Self::ZeroTicket => "ID_ZERO_TICKET",
            Self::PeerFormat { .. } => "ID_PEER_FORMAT",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Canonical 64-bit identifier of a remote entity.
///
/// Immutable once assigned. Two entities with the same `CanonicalId`
/// are the same remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(i64);

impl CanonicalId {
    /// Wraps a raw integer.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw integer.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Decodes an opaque wire token.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Base64`] for malformed base64 and
    /// [`IdError::Empty`] when the token carries no bytes.
    pub fn from_opaque(token: &str) -> Result<Self, IdError> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|e| IdError::Base64 {
                input: token.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_be_bytes(&bytes)
    }

    /// Interprets `bytes` as a big-endian two's-complement integer,
    /// truncated to 64 bits.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] for an empty slice.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, IdError> {
        let Some(&first) = bytes.first() else {
            return Err(IdError::Empty);
        };

        let fill = if first & 0x80 == 0 { 0x00 } else { 0xFF };
        let mut buf = [fill; 8];
        let tail = &bytes[bytes.len().saturating_sub(8)..];
        buf[8 - tail.len()..].copy_from_slice(tail);

        Ok(Self(i64::from_be_bytes(buf)))
    }

    /// Encodes this identifier as an opaque wire token.
    ///
    /// Uses the shortest two's-complement byte sequence, so
    /// `from_opaque(id.to_opaque()) == id` for every value.
    #[must_use]
    pub fn to_opaque(self) -> String {
        let bytes = self.0.to_be_bytes();
        let mut start = 0;
        while start < bytes.len() - 1 {
            let (head, next) = (bytes[start], bytes[start + 1]);
            let redundant =
                (head == 0x00 && next & 0x80 == 0) || (head == 0xFF && next & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        STANDARD.encode(&bytes[start..])
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CanonicalId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_opaque(s)
    }
}

/// Authentication identity issued by the server.
///
/// The server uses `0` as "no identity", so an `AuthTicket` is always
/// non-zero; an unauthenticated session holds `None`. Tickets also key
/// the per-entity permission tables: a permission entry describes what
/// the holder of that ticket may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AuthTicket(i64);

impl AuthTicket {
    /// Creates a ticket, or `None` for the zero sentinel.
    #[must_use]
    pub const fn new(value: i64) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Returns the raw ticket value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parses a decimal ticket, as returned in an auth response body.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::TicketFormat`] when the text is not an integer
    /// and [`IdError::ZeroTicket`] for `0`.
    pub fn parse(text: &str) -> Result<Self, IdError> {
        let trimmed = text.trim();
        let value: i64 = trimmed.parse().map_err(|_| IdError::TicketFormat {
            input: trimmed.to_string(),
        })?;
        Self::new(value).ok_or(IdError::ZeroTicket)
    }
}

impl TryFrom<i64> for AuthTicket {
    type Error = IdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(IdError::ZeroTicket)
    }
}

impl From<AuthTicket> for i64 {
    fn from(ticket: AuthTicket) -> Self {
        ticket.0
    }
}

impl FromStr for AuthTicket {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AuthTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of a per-entity permission table.
///
/// Unlike [`AuthTicket`] this admits `0`, which the server uses for
/// access granted to unauthenticated callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(i64);

impl PeerId {
    /// Entry that applies to unauthenticated callers.
    pub const ANONYMOUS: Self = Self(0);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parses a decimal table key.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::PeerFormat`] when the text is not an integer.
    pub fn parse(text: &str) -> Result<Self, IdError> {
        let trimmed = text.trim();
        trimmed.parse().map(Self).map_err(|_| IdError::PeerFormat {
            input: trimmed.to_string(),
        })
    }
}

impl From<AuthTicket> for PeerId {
    fn from(ticket: AuthTicket) -> Self {
        Self(ticket.0)
    }
}

impl FromStr for PeerId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
