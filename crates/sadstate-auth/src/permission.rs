//! Permission bitsets.
//!
//! Two independent flag tables exist, one per entity kind. They are
//! distinct types so a profile permission can never be passed where a
//! project permission is required:
//!
//! | Type | Flags (bit 0 → n) |
//! |------|-------------------|
//! | [`ProjectPermissions`] | EDIT, DELETE, VIEW, ADD_PROFILE, EDIT_PROFILE, REMOVE_PROFILE |
//! | [`ProfilePermissions`] | READ, WRITE, EDIT |
//!
//! Both are immutable `Copy` values; every combinator returns a new set.
//!
//! # Rendering
//!
//! [`PermissionSet::describe`] concatenates the names of every set flag in
//! table order with no separator (`EDITVIEW`). It is display-only. Use
//! [`PermissionSet::names`] when a list is needed; `Display` joins the
//! names with `" | "`.
//!
//! # Example
//!
//! ```
//! use sadstate_auth::{CombineOp, PermissionSet, ProjectPermissions};
//!
//! let a = ProjectPermissions::VIEW | ProjectPermissions::EDIT;
//! let b = ProjectPermissions::VIEW;
//!
//! assert_eq!(a.combine(b, CombineOp::And), ProjectPermissions::VIEW);
//! assert_eq!(a.describe(), "EDITVIEW");
//! assert_eq!(a.to_string(), "EDIT | VIEW");
//! assert_eq!(a.flag(), 0b101);
//! ```

use bitflags::{bitflags, Flags};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean operator for [`PermissionSet::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombineOp {
    /// Union.
    Or,
    /// Intersection.
    And,
    /// Symmetric difference.
    Xor,
}

/// Behaviour shared by every permission table.
///
/// Implementors only need to be a `u32` bitflags type; all methods are
/// provided and driven by the flag table's declaration order.
pub trait PermissionSet: Flags<Bits = u32> + Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Builds a set from wire bits, dropping bits outside the table.
    #[must_use]
    fn from_flag(flag: u32) -> Self {
        Self::from_bits_truncate(flag)
    }

    /// Returns the raw integer bit-field.
    #[must_use]
    fn flag(self) -> u32 {
        self.bits()
    }

    /// Combines two sets with the given operator.
    #[must_use]
    fn combine(self, other: Self, op: CombineOp) -> Self {
        match op {
            CombineOp::Or => self.union(other),
            CombineOp::And => self.intersection(other),
            CombineOp::Xor => self.symmetric_difference(other),
        }
    }

    /// Names of every set flag, in table order.
    #[must_use]
    fn names(self) -> Vec<&'static str> {
        Self::FLAGS
            .iter()
            .filter(|flag| self.contains(*flag.value()))
            .map(|flag| flag.name())
            .collect()
    }

    /// Concatenated flag names in table order, no separator.
    ///
    /// The empty set renders as the empty string.
    #[must_use]
    fn describe(self) -> String {
        self.names().concat()
    }

    /// Parses one flag name, case-insensitively.
    #[must_use]
    fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        Self::FLAGS
            .iter()
            .find(|flag| flag.name() == upper)
            .map(|flag| *flag.value())
    }
}

bitflags! {
    /// What a peer may do to a project.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProjectPermissions: u32 {
        /// Rename the project or change its fields.
        const EDIT           = 0b00_0001;
        /// Delete the project and all of its profiles.
        const DELETE         = 0b00_0010;
        /// Fetch the project and list its profiles.
        const VIEW           = 0b00_0100;
        /// Create profiles inside the project.
        const ADD_PROFILE    = 0b00_1000;
        /// Change profile metadata.
        const EDIT_PROFILE   = 0b01_0000;
        /// Remove profiles from the project.
        const REMOVE_PROFILE = 0b10_0000;
    }
}

impl ProjectPermissions {
    /// Permission granted when none is specified.
    pub const DEFAULT: Self = Self::VIEW;
}

impl PermissionSet for ProjectPermissions {}

bitflags! {
    /// What a peer may do to a profile.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProfilePermissions: u32 {
        /// Read profile contents.
        const READ  = 0b001;
        /// Write or append profile contents.
        const WRITE = 0b010;
        /// Change profile metadata.
        const EDIT  = 0b100;
    }
}

impl ProfilePermissions {
    /// Permission granted when none is specified.
    pub const DEFAULT: Self = Self::READ;
}

impl PermissionSet for ProfilePermissions {}

fn fmt_names<P: PermissionSet>(set: P, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names = set.names();
    if names.is_empty() {
        write!(f, "(none)")
    } else {
        write!(f, "{}", names.join(" | "))
    }
}

impl fmt::Display for ProjectPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_names(*self, f)
    }
}

impl fmt::Display for ProfilePermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_names(*self, f)
    }
}
