//! Per-kind entity cache.
//!
//! Maps a [`CanonicalId`] to the shared record of that entity. Every
//! handle a caller holds points at the same `Arc`, so merging fresh
//! state into a cached record is visible to all of them.
//!
//! # Coherency
//!
//! | Event | Effect |
//! |-------|--------|
//! | fetch, ID cached | merge payload into the cached record, return it |
//! | fetch, ID new | insert a new record |
//! | refresh drift | evict the *old* ID |
//! | identity change | [`EntityCache::clear`] |
//!
//! The cache itself is not synchronized; the session guards both caches
//! behind one lock.

use crate::record::Record;
use parking_lot::RwLock;
use sadstate_auth::PermissionSet;
use sadstate_types::CanonicalId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared, mutable record of one entity.
pub type SharedRecord<P> = Arc<RwLock<Record<P>>>;

/// Which cache an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Profile,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Profile => write!(f, "profile"),
        }
    }
}

/// Identity-indexed map of shared records.
pub struct EntityCache<P: PermissionSet> {
    entries: HashMap<CanonicalId, SharedRecord<P>>,
}

impl<P: PermissionSet> Default for EntityCache<P> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<P: PermissionSet> fmt::Debug for EntityCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<P: PermissionSet> EntityCache<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: CanonicalId) -> Option<SharedRecord<P>> {
        self.entries.get(&id).cloned()
    }

    /// Returns the cached record for `fresh.id()`, merged with `fresh`,
    /// or inserts `fresh` as a new record.
    pub fn get_or_create(&mut self, fresh: Record<P>) -> SharedRecord<P> {
        match self.entries.get(&fresh.id()) {
            Some(existing) => {
                existing.write().merge(fresh);
                Arc::clone(existing)
            }
            None => {
                let id = fresh.id();
                let shared = Arc::new(RwLock::new(fresh));
                self.entries.insert(id, Arc::clone(&shared));
                shared
            }
        }
    }

    /// Removes `id`. Returns whether it was present.
    pub fn evict(&mut self, id: CanonicalId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn contains(&self, id: CanonicalId) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sadstate_auth::{PermissionTable, ProjectPermissions};
    use sadstate_types::AuthTicket;

    fn record(id: i64, name: &str) -> Record<ProjectPermissions> {
        Record::new(CanonicalId::new(id), name, PermissionTable::new())
    }

    #[test]
    fn same_id_returns_same_instance() {
        let mut cache = EntityCache::new();
        let first = cache.get_or_create(record(1, "a"));
        let second = cache.get_or_create(record(1, "b"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.read().name, "b");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn merge_is_visible_to_outstanding_handles() {
        let mut cache = EntityCache::new();
        let held = cache.get_or_create(record(7, "old"));

        let mut fresh = record(7, "new");
        let ticket = AuthTicket::new(3).expect("non-zero");
        fresh.permissions.insert(ticket.into(), ProjectPermissions::VIEW);
        cache.get_or_create(fresh);

        let guard = held.read();
        assert_eq!(guard.name, "new");
        assert_eq!(guard.granted_to(ticket), ProjectPermissions::VIEW);
    }

    #[test]
    fn evict_and_clear() {
        let mut cache = EntityCache::new();
        cache.get_or_create(record(1, "a"));
        cache.get_or_create(record(2, "b"));

        assert!(cache.evict(CanonicalId::new(1)));
        assert!(!cache.evict(CanonicalId::new(1)));
        assert!(!cache.contains(CanonicalId::new(1)));
        assert!(cache.contains(CanonicalId::new(2)));

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(CanonicalId::new(2)).is_none());
    }

    #[test]
    fn kind_display() {
        assert_eq!(EntityKind::Project.to_string(), "project");
        assert_eq!(EntityKind::Profile.to_string(), "profile");
    }
}
