//! Permission model for sadstate entities.
//!
//! Every project and profile carries a table mapping a peer's
//! [`PeerId`](sadstate_types::PeerId) to a permission bitset.
//! The bitsets are plain `bitflags` values with table-driven rendering:
//!
//! | Type | Scope |
//! |------|-------|
//! | [`ProjectPermissions`] | What a peer may do to a project |
//! | [`ProfilePermissions`] | What a peer may do to a profile |
//! | [`RequiredPermission`] | What an operation needed when refused |
//!
//! The two bitset types never mix; [`PermissionSet`] is the shared
//! behaviour (combine, describe, parse) and is implemented by both.

mod permission;
mod required;

pub use permission::{CombineOp, PermissionSet, ProfilePermissions, ProjectPermissions};
pub use required::{granted_to, PermissionTable, RequiredPermission};
