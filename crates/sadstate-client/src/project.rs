//! Project handle.

use crate::cache::SharedRecord;
use crate::edit::ProjectEdit;
use crate::multipart::MultipartForm;
use crate::profile::Profile;
use crate::record::{encode_permissions, Record};
use crate::response::Response;
use crate::session::{upgrade, Session, SessionInner};
use crate::transport::Request;
use crate::ClientError;
use sadstate_auth::{PermissionTable, ProfilePermissions, ProjectPermissions};
use sadstate_types::{CanonicalId, PeerId};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Weak};

/// A project as seen by the session's current identity.
///
/// Clones share the same record; a refresh through any handle (or a
/// fresh fetch of the same ID) is visible through all of them.
#[derive(Clone)]
pub struct Project {
    record: SharedRecord<ProjectPermissions>,
    session: Weak<SessionInner>,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.read();
        f.debug_struct("Project")
            .field("id", &record.id())
            .field("name", &record.name)
            .finish()
    }
}

impl Project {
    pub(crate) fn new(record: SharedRecord<ProjectPermissions>, session: Weak<SessionInner>) -> Self {
        Self { record, session }
    }

    #[must_use]
    pub fn id(&self) -> CanonicalId {
        self.record.read().id()
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.record.read().name.clone()
    }

    #[must_use]
    pub fn permissions(&self) -> PermissionTable<ProjectPermissions> {
        self.record.read().permissions.clone()
    }

    /// What `peer` may do to this project.
    #[must_use]
    pub fn granted_to(&self, peer: impl Into<PeerId>) -> ProjectPermissions {
        self.record.read().granted_to(peer)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Record<ProjectPermissions> {
        self.record.read().clone()
    }

    #[must_use]
    pub fn record(&self) -> &SharedRecord<ProjectPermissions> {
        &self.record
    }

    /// Whether both handles point at the same cached instance.
    #[must_use]
    pub fn same_entity(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }

    /// The issuing session, if it is still alive.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        upgrade(&self.session).ok()
    }

    pub(crate) fn live_session(&self) -> Result<Session, ClientError> {
        upgrade(&self.session)
    }

    /// Re-fetches this project by name; see [`Session::refresh_project`].
    pub fn refresh(&self) -> Response<Project> {
        match self.live_session() {
            Ok(session) => session.refresh_project(self),
            Err(e) => Response::failure(e),
        }
    }

    /// Applies `edit` remotely, then locally on success.
    pub fn edit(&self, edit: &ProjectEdit) -> Response<()> {
        let session = match self.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let fields = match session.encode_fields(edit.to_fields()) {
            Ok(text) => text,
            Err(e) => return Response::failure(e),
        };
        let form = MultipartForm::new()
            .text("name", self.name())
            .text("fields", fields);
        let request = Request::post_form(session.url("/project/edit", &[]), &form);
        let response = session.execute(request, ProjectPermissions::EDIT.into(), |_| Ok(()));
        if response.is_success() {
            edit.apply(&mut self.record.write());
        }
        response
    }

    /// Deletes the project and all of its profiles, evicting it on success.
    pub fn delete(&self) -> Response<()> {
        let session = match self.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let name = self.name();
        let request = Request::delete(session.url("/project/delete", &[("name", &name)]));
        let response = session.execute(request, ProjectPermissions::DELETE.into(), |_| Ok(()));
        if response.is_success() {
            session.evict::<ProjectPermissions>(self.id());
        }
        response
    }

    /// Fetches one profile of this project through the profile cache.
    pub fn get_profile(&self, name: &str) -> Response<Profile> {
        let session = match self.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let generation = session.generation();
        let project_name = self.name();
        let request = Request::get(session.url(
            "/project/profile/get",
            &[("name", &project_name), ("profile_name", name)],
        ));
        session
            .execute(request, ProjectPermissions::VIEW.into(), |body| {
                session.decode_record::<ProfilePermissions>(body)
            })
            .map(|fresh| Profile::new(session.intern(fresh, generation), self.clone()))
    }

    /// Fetches every profile of this project; each goes through the cache.
    pub fn get_all_profiles(&self) -> Response<Vec<Profile>> {
        let session = match self.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let generation = session.generation();
        let name = self.name();
        let request = Request::get(session.url("/project/profile/all", &[("name", &name)]));
        session
            .execute(request, ProjectPermissions::VIEW.into(), |body| {
                session.decode_records::<ProfilePermissions>(body)
            })
            .map(|records| {
                records
                    .into_iter()
                    .map(|fresh| Profile::new(session.intern(fresh, generation), self.clone()))
                    .collect()
            })
    }

    /// Creates a profile in this project.
    pub fn add_profile(
        &self,
        name: &str,
        permissions: Option<&PermissionTable<ProfilePermissions>>,
        fields: Map<String, Value>,
    ) -> Response<()> {
        let session = match self.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let mut fields = fields;
        fields.insert(
            "permissions".to_string(),
            permissions.map_or(Value::Null, encode_permissions),
        );
        let fields = match session.encode_fields(fields) {
            Ok(text) => text,
            Err(e) => return Response::failure(e),
        };
        let form = MultipartForm::new()
            .text("name", self.name())
            .text("profile_name", name)
            .text("fields", fields);
        let request = Request::post_form(session.url("/project/profile/add", &[]), &form);
        session.execute(request, ProjectPermissions::ADD_PROFILE.into(), |_| Ok(()))
    }

    /// Removes the named profile from this project.
    ///
    /// Does not touch the profile cache; [`Profile::remove`] does.
    pub fn remove_profile(&self, name: &str) -> Response<()> {
        let session = match self.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let project_name = self.name();
        let request = Request::post(session.url(
            "/project/profile/remove",
            &[("name", &project_name), ("profile_name", name)],
        ));
        session.execute(request, ProjectPermissions::REMOVE_PROFILE.into(), |_| Ok(()))
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.same_entity(other) || self.id() == other.id()
    }
}

impl Eq for Project {}
