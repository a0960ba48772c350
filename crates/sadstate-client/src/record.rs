//! Decoded entity state.
//!
//! Projects and profiles share one record shape; they differ only in the
//! permission table type `P`.
//!
//! ```json
//! { "id": "AQ==", "name": "robotics", "permissions": { "17": 5 } }
//! ```

use crate::codec::kind_of;
use crate::ClientError;
use sadstate_auth::{PermissionSet, PermissionTable};
use sadstate_types::{CanonicalId, PeerId};
use serde_json::{Map, Value};

/// Mutable state of one cached entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<P: PermissionSet> {
    id: CanonicalId,
    pub name: String,
    pub permissions: PermissionTable<P>,
}

impl<P: PermissionSet> Record<P> {
    #[must_use]
    pub fn new(id: CanonicalId, name: impl Into<String>, permissions: PermissionTable<P>) -> Self {
        Self {
            id,
            name: name.into(),
            permissions,
        }
    }

    /// Builds a record from a decoded payload.
    ///
    /// `permissions` may be absent or null (empty table). Unknown
    /// permission bits are dropped.
    ///
    /// # Errors
    ///
    /// [`ClientError::MalformedPayload`] for missing or mistyped fields,
    /// [`ClientError::Identifier`] for an undecodable `id`.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ClientError> {
        let id = match payload.get("id") {
            Some(Value::String(token)) => CanonicalId::from_opaque(token)?,
            Some(other) => {
                return Err(ClientError::malformed(
                    "id",
                    format!("expected string, got {}", kind_of(other)),
                ))
            }
            None => return Err(ClientError::malformed("id", "missing")),
        };

        let name = match payload.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(ClientError::malformed(
                    "name",
                    format!("expected string, got {}", kind_of(other)),
                ))
            }
            None => return Err(ClientError::malformed("name", "missing")),
        };

        let permissions = match payload.get("permissions") {
            None | Some(Value::Null) => PermissionTable::new(),
            Some(Value::Object(entries)) => decode_permissions(entries)?,
            Some(other) => {
                return Err(ClientError::malformed(
                    "permissions",
                    format!("expected object, got {}", kind_of(other)),
                ))
            }
        };

        Ok(Self {
            id,
            name,
            permissions,
        })
    }

    #[must_use]
    pub fn id(&self) -> CanonicalId {
        self.id
    }

    /// Applies fresh state in place. The ID never changes.
    pub fn merge(&mut self, fresh: Self) {
        self.name = fresh.name;
        self.permissions = fresh.permissions;
    }

    /// What `peer` may do to this entity.
    #[must_use]
    pub fn granted_to(&self, peer: impl Into<PeerId>) -> P {
        sadstate_auth::granted_to(&self.permissions, peer)
    }
}

fn decode_permissions<P: PermissionSet>(
    entries: &Map<String, Value>,
) -> Result<PermissionTable<P>, ClientError> {
    let mut table = PermissionTable::with_capacity(entries.len());
    for (key, value) in entries {
        let peer = PeerId::parse(key)?;
        let bits = value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                ClientError::malformed(
                    "permissions",
                    format!("value for '{key}' is not a 32-bit flag"),
                )
            })?;
        table.insert(peer, P::from_flag(bits));
    }
    Ok(table)
}

/// Encodes a permission table as `{ "<peer>": bits }`.
#[must_use]
pub fn encode_permissions<P: PermissionSet>(table: &PermissionTable<P>) -> Value {
    let map: Map<String, Value> = table
        .iter()
        .map(|(peer, set)| (peer.to_string(), Value::from(set.flag())))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sadstate_auth::{ProfilePermissions, ProjectPermissions};
    use sadstate_types::AuthTicket;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn ticket(n: i64) -> AuthTicket {
        AuthTicket::new(n).expect("non-zero")
    }

    #[test]
    fn decodes_full_payload() {
        let payload = object(json!({
            "id": CanonicalId::new(300).to_opaque(),
            "name": "robotics",
            "permissions": { "17": 5, "-3": 1 }
        }));
        let record: Record<ProjectPermissions> = Record::from_payload(&payload).expect("decode");

        assert_eq!(record.id(), CanonicalId::new(300));
        assert_eq!(record.name, "robotics");
        assert_eq!(
            record.granted_to(ticket(17)),
            ProjectPermissions::EDIT | ProjectPermissions::VIEW
        );
        assert_eq!(record.granted_to(ticket(-3)), ProjectPermissions::EDIT);
        assert_eq!(record.granted_to(ticket(99)), ProjectPermissions::empty());
    }

    #[test]
    fn anonymous_permission_key_is_accepted() {
        let payload = object(json!({
            "id": "AQ==",
            "name": "public",
            "permissions": { "0": 4, "17": 63 }
        }));
        let record: Record<ProjectPermissions> = Record::from_payload(&payload).expect("decode");

        assert_eq!(record.granted_to(PeerId::ANONYMOUS), ProjectPermissions::VIEW);
        assert_eq!(record.granted_to(ticket(17)), ProjectPermissions::all());
        assert_eq!(encode_permissions(&record.permissions)["0"], 4);
    }

    #[test]
    fn missing_permissions_is_empty_table() {
        let payload = object(json!({"id": "AQ==", "name": "p", "permissions": null}));
        let record: Record<ProfilePermissions> = Record::from_payload(&payload).expect("decode");
        assert!(record.permissions.is_empty());
    }

    #[test]
    fn missing_id_is_malformed() {
        let payload = object(json!({"name": "p"}));
        let err = Record::<ProjectPermissions>::from_payload(&payload).expect_err("no id");
        assert!(matches!(err, ClientError::MalformedPayload { ref field, .. } if field == "id"));
    }

    #[test]
    fn bad_id_is_identifier_error() {
        let payload = object(json!({"id": "!!", "name": "p"}));
        let err = Record::<ProjectPermissions>::from_payload(&payload).expect_err("bad id");
        assert!(matches!(err, ClientError::Identifier(_)));
    }

    #[test]
    fn bad_permission_key_is_rejected() {
        let payload = object(json!({"id": "AQ==", "name": "p", "permissions": {"abc": 1}}));
        let err = Record::<ProjectPermissions>::from_payload(&payload).expect_err("bad key");
        assert!(matches!(err, ClientError::Identifier(_)));

        let payload = object(json!({"id": "AQ==", "name": "p", "permissions": {"4": "x"}}));
        let err = Record::<ProjectPermissions>::from_payload(&payload).expect_err("bad value");
        assert!(matches!(err, ClientError::MalformedPayload { .. }));
    }

    #[test]
    fn merge_keeps_id_and_is_idempotent() {
        let mut record: Record<ProjectPermissions> =
            Record::new(CanonicalId::new(1), "old", PermissionTable::new());
        let mut table = PermissionTable::new();
        table.insert(ticket(5).into(), ProjectPermissions::VIEW);
        let fresh = Record::new(CanonicalId::new(2), "new", table);

        record.merge(fresh.clone());
        let once = record.clone();
        record.merge(fresh);

        assert_eq!(record, once);
        assert_eq!(record.id(), CanonicalId::new(1));
        assert_eq!(record.name, "new");
    }

    #[test]
    fn encode_permissions_uses_decimal_keys() {
        let mut table = PermissionTable::new();
        table.insert(PeerId::new(42), ProfilePermissions::READ | ProfilePermissions::WRITE);
        assert_eq!(encode_permissions(&table), json!({"42": 3}));
    }
}
