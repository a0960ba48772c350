//! The permission an operation needed when the server refused it.
//!
//! The server never echoes which permission was missing on a 403; the
//! calling operation knows a priori what it required and attaches it.

use crate::{PermissionSet, ProfilePermissions, ProjectPermissions};
use sadstate_types::PeerId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Per-entity permission table: peer → what it may do.
///
/// Keyed by [`PeerId`] so the anonymous entry (`0`) can be represented.
pub type PermissionTable<P> = HashMap<PeerId, P>;

/// Permission attached to an `InvalidPermission` outcome.
///
/// ```
/// use sadstate_auth::{ProjectPermissions, RequiredPermission};
///
/// let required = RequiredPermission::from(ProjectPermissions::VIEW);
/// assert_eq!(required.to_string(), "project:VIEW");
/// assert_eq!(required.project(), Some(ProjectPermissions::VIEW));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "scope", content = "flags", rename_all = "snake_case")]
pub enum RequiredPermission {
    /// The operation needs an authenticated identity, not an entity flag
    /// (authentication itself, project registration).
    Authenticated,
    /// A project-scope flag.
    Project(ProjectPermissions),
    /// A profile-scope flag.
    Profile(ProfilePermissions),
}

impl RequiredPermission {
    /// Returns the project flag, if this is a project-scope requirement.
    #[must_use]
    pub fn project(self) -> Option<ProjectPermissions> {
        match self {
            Self::Project(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the profile flag, if this is a profile-scope requirement.
    #[must_use]
    pub fn profile(self) -> Option<ProfilePermissions> {
        match self {
            Self::Profile(p) => Some(p),
            _ => None,
        }
    }
}

impl From<ProjectPermissions> for RequiredPermission {
    fn from(p: ProjectPermissions) -> Self {
        Self::Project(p)
    }
}

impl From<ProfilePermissions> for RequiredPermission {
    fn from(p: ProfilePermissions) -> Self {
        Self::Profile(p)
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => write!(f, "authenticated"),
            Self::Project(p) => write!(f, "project:{}", p.names().join("|")),
            Self::Profile(p) => write!(f, "profile:{}", p.names().join("|")),
        }
    }
}

/// Returns what `peer` may do according to `table`, or the empty set.
#[must_use]
pub fn granted_to<P: PermissionSet>(table: &PermissionTable<P>, peer: impl Into<PeerId>) -> P {
    table.get(&peer.into()).copied().unwrap_or_else(P::empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sadstate_types::AuthTicket;

    #[test]
    fn scopes_are_distinct() {
        let project = RequiredPermission::from(ProjectPermissions::EDIT);
        let profile = RequiredPermission::from(ProfilePermissions::EDIT);
        assert_ne!(project, profile);
        assert_eq!(project.profile(), None);
        assert_eq!(profile.profile(), Some(ProfilePermissions::EDIT));
    }

    #[test]
    fn display_names_scope() {
        assert_eq!(RequiredPermission::Authenticated.to_string(), "authenticated");
        assert_eq!(
            RequiredPermission::from(ProfilePermissions::WRITE).to_string(),
            "profile:WRITE"
        );
    }

    #[test]
    fn granted_to_defaults_to_empty() {
        let owner = AuthTicket::new(7).expect("non-zero");
        let stranger = AuthTicket::new(8).expect("non-zero");
        let mut table = PermissionTable::new();
        table.insert(owner.into(), ProjectPermissions::all());

        assert_eq!(granted_to(&table, owner), ProjectPermissions::all());
        assert_eq!(granted_to(&table, stranger), ProjectPermissions::empty());
    }

    #[test]
    fn anonymous_entry_is_addressable() {
        let mut table = PermissionTable::new();
        table.insert(PeerId::ANONYMOUS, ProjectPermissions::VIEW);

        assert_eq!(granted_to(&table, PeerId::ANONYMOUS), ProjectPermissions::VIEW);
    }

    #[test]
    fn serializes_with_scope_tag() {
        let json = serde_json::to_value(RequiredPermission::Authenticated).expect("serialize");
        assert_eq!(json, serde_json::json!({"scope": "authenticated"}));
    }
}
