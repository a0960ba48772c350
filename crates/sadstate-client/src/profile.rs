//! Profile handle.

use crate::cache::SharedRecord;
use crate::edit::ProfileEdit;
use crate::multipart::MultipartForm;
use crate::project::Project;
use crate::record::Record;
use crate::response::{Outcome, Response};
use crate::session::Session;
use crate::transport::Request;
use crate::ClientError;
use sadstate_auth::{PermissionTable, ProfilePermissions, ProjectPermissions};
use sadstate_types::{CanonicalId, PeerId};
use std::fmt;
use std::sync::Arc;

/// A profile inside a [`Project`].
#[derive(Clone)]
pub struct Profile {
    record: SharedRecord<ProfilePermissions>,
    project: Project,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.read();
        f.debug_struct("Profile")
            .field("id", &record.id())
            .field("name", &record.name)
            .field("project", &self.project.id())
            .finish()
    }
}

impl Profile {
    pub(crate) fn new(record: SharedRecord<ProfilePermissions>, project: Project) -> Self {
        Self { record, project }
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
    pub fn permissions(&self) -> PermissionTable<ProfilePermissions> {
        self.record.read().permissions.clone()
    }

    #[must_use]
    pub fn granted_to(&self, peer: impl Into<PeerId>) -> ProfilePermissions {
        self.record.read().granted_to(peer)
    }

    #[must_use]
    pub fn snapshot(&self) -> Record<ProfilePermissions> {
        self.record.read().clone()
    }

    #[must_use]
    pub fn record(&self) -> &SharedRecord<ProfilePermissions> {
        &self.record
    }

    /// The owning project.
    #[must_use]
    pub fn project(&self) -> &Project {
        &self.project
    }

    #[must_use]
    pub fn same_entity(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.project.session()
    }

    fn query(&self) -> [(&'static str, String); 2] {
        [("name", self.project.name()), ("profile_name", self.name())]
    }

    fn url(&self, session: &Session, path: &str) -> String {
        let query = self.query();
        let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        session.url(path, &pairs)
    }

    /// Re-fetches this profile by name and merges in place.
    ///
    /// Same drift protocol as [`Session::refresh_project`], applied to the
    /// profile cache.
    pub fn refresh(&self) -> Response<Profile> {
        let session = match self.project.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let request = Request::get(self.url(&session, "/project/profile/get"));
        session
            .refresh_record(&self.record, request, ProjectPermissions::VIEW.into())
            .map(|()| self.clone())
    }

    /// Applies `edit` remotely, then locally on success.
    pub fn edit(&self, edit: &ProfileEdit) -> Response<()> {
        let session = match self.project.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let fields = match session.encode_fields(edit.to_fields()) {
            Ok(text) => text,
            Err(e) => return Response::failure(e),
        };
        let form = MultipartForm::new()
            .text("name", self.project.name())
            .text("profile_name", self.name())
            .text("fields", fields);
        let request = Request::post_form(session.url("/project/edit", &[]), &form);
        let response =
            session.execute(request, ProjectPermissions::EDIT_PROFILE.into(), |_| Ok(()));
        if response.is_success() {
            edit.apply(&mut self.record.write());
        }
        response
    }

    /// Reads the profile contents as raw bytes.
    pub fn read(&self) -> Response<Vec<u8>> {
        let session = match self.project.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let request = Request::get(self.url(&session, "/project/profile/read"));
        session.execute(request, ProfilePermissions::READ.into(), |body| {
            Ok(body.to_vec())
        })
    }

    /// Replaces the contents. Returns the remaining space in bytes.
    pub fn write(&self, data: &[u8]) -> Response<u64> {
        self.upload("/project/profile/write", data)
    }

    /// Appends to the contents. Returns the remaining space in bytes.
    pub fn append(&self, data: &[u8]) -> Response<u64> {
        self.upload("/project/profile/append", data)
    }

    fn upload(&self, path: &str, data: &[u8]) -> Response<u64> {
        let session = match self.project.live_session() {
            Ok(session) => session,
            Err(e) => return Response::failure(e),
        };
        let form = MultipartForm::new()
            .text("name", self.project.name())
            .text("profile_name", self.name())
            .file("data", "data", data);
        let request = Request::post_form(session.url(path, &[]), &form);
        session.execute(request, ProfilePermissions::WRITE.into(), decode_remaining)
    }

    /// Removes this profile from its project.
    ///
    /// On `Success` or `NotFound` the profile is evicted from the cache.
    pub fn remove(&self) -> Response<()> {
        let response = self.project.remove_profile(&self.name());
        if matches!(response.outcome, Outcome::Success(()) | Outcome::NotFound) {
            if let Ok(session) = self.project.live_session() {
                session.evict::<ProfilePermissions>(self.id());
            }
        }
        response
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.same_entity(other) || self.id() == other.id()
    }
}

impl Eq for Profile {}

fn decode_remaining(body: &[u8]) -> Result<u64, ClientError> {
    let text = std::str::from_utf8(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    text.trim()
        .parse()
        .map_err(|_| ClientError::Decode(format!("remaining space '{}' is not an integer", text.trim())))
}
