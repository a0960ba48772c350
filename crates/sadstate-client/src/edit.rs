//! Edit requests for projects and profiles.

use crate::record::{encode_permissions, Record};
use sadstate_auth::{PermissionSet, PermissionTable, ProfilePermissions, ProjectPermissions};
use sadstate_types::PeerId;
use serde_json::{Map, Value};

/// Changes to apply to an entity.
///
/// `name` and `permissions` are sent as `null` when unset. Permission
/// entries are upserted on success; peers not mentioned keep theirs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit<P: PermissionSet> {
    pub name: Option<String>,
    pub permissions: Option<PermissionTable<P>>,
    pub fields: Map<String, Value>,
}

impl<P: PermissionSet> Default for Edit<P> {
    fn default() -> Self {
        Self {
            name: None,
            permissions: None,
            fields: Map::new(),
        }
    }
}

/// Edit of a project.
pub type ProjectEdit = Edit<ProjectPermissions>;
/// Edit of a profile.
pub type ProfileEdit = Edit<ProfilePermissions>;

impl<P: PermissionSet> Edit<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn grant(mut self, peer: impl Into<PeerId>, set: P) -> Self {
        self.permissions
            .get_or_insert_with(PermissionTable::new)
            .insert(peer.into(), set);
        self
    }

    /// Adds a free-form field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The `fields` document sent to the server.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.fields.clone();
        fields.insert(
            "name".to_string(),
            self.name.clone().map_or(Value::Null, Value::String),
        );
        fields.insert(
            "permissions".to_string(),
            self.permissions
                .as_ref()
                .map_or(Value::Null, encode_permissions),
        );
        fields
    }

    /// Applies an accepted edit to the local record.
    pub fn apply(&self, record: &mut Record<P>) {
        if let Some(name) = &self.name {
            record.name.clone_from(name);
        }
        if let Some(permissions) = &self.permissions {
            for (peer, set) in permissions {
                record.permissions.insert(*peer, *set);
            }
        }
    }
}
