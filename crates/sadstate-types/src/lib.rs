//! Core types for the sadstate client.
//!
//! This crate sits at the bottom of the workspace and has no I/O:
//!
//! ```text
//! sadstate-types   (CanonicalId, AuthTicket, PeerId, ErrorCode)  ◄── HERE
//!     ↑
//! sadstate-auth    (ProjectPermissions, ProfilePermissions)
//!     ↑
//! sadstate-client  (Session, Project, Profile, Response)
//!     ↑
//! sadstate-cli     (binary)
//! ```
//!
//! # Identifiers
//!
//! Identifiers cross the wire as opaque base64 tokens and are used
//! internally as [`CanonicalId`] integers. [`CanonicalId::from_opaque`]
//! is the only conversion point from the wire form.

mod error;
mod id;

pub use error::{is_valid_code, ErrorCode};
pub use id::{AuthTicket, CanonicalId, IdError, PeerId};
