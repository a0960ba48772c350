//! Session: authentication state, transport, and the entity caches.
//!
//! # Locking
//!
//! All mutable session state sits behind one `parking_lot::Mutex`:
//!
//! ```text
//! SessionState
//!   ├── ticket:     Option<AuthTicket>
//!   ├── generation: u64          (bumped on every cache clear)
//!   ├── projects:   EntityCache<ProjectPermissions>
//!   └── profiles:   EntityCache<ProfilePermissions>
//! ```
//!
//! The lock is never held across a transport call. Operations sample
//! `generation` before sending and only touch the cache afterwards if it
//! is unchanged, so a result that raced a re-authentication is handed to
//! the caller but never inserted into the cleared cache.
//!
//! Lock order: session state, then record.

use crate::cache::{EntityCache, EntityKind, SharedRecord};
use crate::codec::{Codec, JsonCodec};
use crate::config::ClientConfig;
use crate::multipart::MultipartForm;
use crate::project::Project;
use crate::record::{encode_permissions, Record};
use crate::response::{classify, Outcome, Response};
use crate::transport::{HttpTransport, Request, Transport};
use crate::ClientError;
use parking_lot::{Mutex, RwLock};
use sadstate_auth::{
    PermissionSet, PermissionTable, ProfilePermissions, ProjectPermissions, RequiredPermission,
};
use sadstate_types::{AuthTicket, CanonicalId};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

pub(crate) struct SessionState {
    ticket: Option<AuthTicket>,
    generation: u64,
    projects: EntityCache<ProjectPermissions>,
    profiles: EntityCache<ProfilePermissions>,
}

impl SessionState {
    fn clear(&mut self) {
        self.projects.clear();
        self.profiles.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Selects the cache a permission type's records live in.
pub(crate) trait CacheSlot: PermissionSet {
    const KIND: EntityKind;

    fn cache(state: &mut SessionState) -> &mut EntityCache<Self>;
}

impl CacheSlot for ProjectPermissions {
    const KIND: EntityKind = EntityKind::Project;

    fn cache(state: &mut SessionState) -> &mut EntityCache<Self> {
        &mut state.projects
    }
}

impl CacheSlot for ProfilePermissions {
    const KIND: EntityKind = EntityKind::Profile;

    fn cache(state: &mut SessionState) -> &mut EntityCache<Self> {
        &mut state.profiles
    }
}

pub(crate) struct SessionInner {
    host: String,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    state: Mutex<SessionState>,
}

/// Root of one logical connection to the service.
///
/// Cheap to clone; clones share the ticket and caches. Entities handed
/// out by a session keep only a weak reference back to it.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Session")
            .field("host", &self.inner.host)
            .field("ticket", &state.ticket)
            .field("projects", &state.projects.len())
            .field("profiles", &state.profiles.len())
            .finish()
    }
}

impl Session {
    /// Creates a session talking HTTP to `config.host`.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let transport = HttpTransport::new(config.timeout(), config.user_agent.clone());
        Self::with_transport(config.host.clone(), Arc::new(transport))
    }

    /// Creates a session over an arbitrary transport with the JSON codec.
    #[must_use]
    pub fn with_transport(host: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(host, transport, Arc::new(JsonCodec))
    }

    #[must_use]
    pub fn with_parts(
        host: impl Into<String>,
        transport: Arc<dyn Transport>,
        codec: Arc<dyn Codec>,
    ) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        debug!("Session created for {}", host);
        Self {
            inner: Arc::new(SessionInner {
                host,
                transport,
                codec,
                state: Mutex::new(SessionState {
                    ticket: None,
                    generation: 0,
                    projects: EntityCache::new(),
                    profiles: EntityCache::new(),
                }),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<SessionInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<SessionInner> {
        Arc::downgrade(&self.inner)
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Current authentication identity, `None` while unauthenticated.
    #[must_use]
    pub fn ticket(&self) -> Option<AuthTicket> {
        self.inner.state.lock().ticket
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.ticket().is_some()
    }

    /// Drops every cached entity of every kind.
    pub fn clear_cache(&self) {
        let mut state = self.inner.state.lock();
        state.clear();
        info!("Session cache cleared (generation {})", state.generation);
    }

    #[must_use]
    pub fn cache_len(&self, kind: EntityKind) -> usize {
        let state = self.inner.state.lock();
        match kind {
            EntityKind::Project => state.projects.len(),
            EntityKind::Profile => state.profiles.len(),
        }
    }

    #[must_use]
    pub fn cached_project(&self, id: CanonicalId) -> Option<SharedRecord<ProjectPermissions>> {
        self.inner.state.lock().projects.get(id)
    }

    #[must_use]
    pub fn cached_profile(&self, id: CanonicalId) -> Option<SharedRecord<ProfilePermissions>> {
        self.inner.state.lock().profiles.get(id)
    }

    // ── Authentication ─────────────────────────────────────────────────

    /// Creates a new identity protected by `password` and adopts it.
    pub fn new_auth(&self, password: &str) -> Response<AuthTicket> {
        let form = MultipartForm::new().text("password", password);
        let request = Request::post_form(self.url("/auth/new", &[]), &form);
        let response = self.execute(request, RequiredPermission::Authenticated, decode_ticket);
        if let Some(ticket) = response.success().copied() {
            self.adopt_ticket(ticket);
        }
        response
    }

    /// Authenticates as an existing identity and adopts it.
    pub fn authenticate(&self, ticket: AuthTicket, password: &str) -> Response<AuthTicket> {
        let form = MultipartForm::new()
            .text("id", ticket.to_string())
            .text("password", password);
        let request = Request::post_form(self.url("/auth/set", &[]), &form);
        let response = self.execute(request, RequiredPermission::Authenticated, |_| Ok(ticket));
        if response.is_success() {
            self.adopt_ticket(ticket);
        }
        response
    }

    /// Swaps the ticket, clearing every cache first when it changes.
    fn adopt_ticket(&self, ticket: AuthTicket) {
        let mut state = self.inner.state.lock();
        if state.ticket == Some(ticket) {
            debug!("Re-authenticated as {}; caches kept", ticket);
            return;
        }
        state.clear();
        state.ticket = Some(ticket);
        info!(
            "Authenticated as {}; caches cleared (generation {})",
            ticket, state.generation
        );
    }

    // ── Projects ───────────────────────────────────────────────────────

    /// Fetches a project by name through the project cache.
    pub fn get_project(&self, name: &str) -> Response<Project> {
        let generation = self.generation();
        let request = Request::get(self.url("/project/get", &[("name", name)]));
        self.execute(request, ProjectPermissions::VIEW.into(), |body| {
            self.decode_record::<ProjectPermissions>(body)
        })
        .map(|fresh| Project::new(self.intern(fresh, generation), self.downgrade()))
    }

    /// Re-fetches `project` by its current name and merges in place.
    ///
    /// Returns `IdentityDrift` if the name now resolves to another ID; the
    /// old ID is evicted and `project` keeps its local state.
    pub fn refresh_project(&self, project: &Project) -> Response<Project> {
        let name = project.name();
        let request = Request::get(self.url("/project/get", &[("name", &name)]));
        self.refresh_record(project.record(), request, ProjectPermissions::VIEW.into())
            .map(|()| project.clone())
    }

    /// Registers a new project owned by the current identity.
    pub fn register_project(
        &self,
        name: &str,
        permissions: Option<&PermissionTable<ProjectPermissions>>,
        fields: Map<String, Value>,
    ) -> Response<()> {
        let mut fields = fields;
        fields.insert(
            "permissions".to_string(),
            permissions.map_or(Value::Null, encode_permissions),
        );
        let fields = match self.encode_fields(fields) {
            Ok(text) => text,
            Err(e) => return Response::failure(e),
        };
        let form = MultipartForm::new().text("name", name).text("fields", fields);
        let request = Request::post_form(self.url("/project/register", &[]), &form);
        self.execute(request, RequiredPermission::Authenticated, |_| Ok(()))
    }

    // ── Shared plumbing for entity handles ─────────────────────────────

    pub(crate) fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.inner.host, path);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    pub(crate) fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Sends one request and classifies the result.
    pub(crate) fn execute<T>(
        &self,
        request: Request,
        required: RequiredPermission,
        decode: impl FnOnce(&[u8]) -> Result<T, ClientError>,
    ) -> Response<T> {
        debug!("{} {}", request.method, request.url);
        let exchange = self.inner.transport.send(&request);
        let response = classify(exchange, required, decode);
        debug!(
            status = ?response.status,
            outcome = response.outcome.kind(),
            "{} {} done",
            request.method,
            request.url
        );
        response
    }

    pub(crate) fn decode_record<P: PermissionSet>(
        &self,
        body: &[u8],
    ) -> Result<Record<P>, ClientError> {
        Record::from_payload(&self.inner.codec.decode_object(body)?)
    }

    pub(crate) fn decode_records<P: PermissionSet>(
        &self,
        body: &[u8],
    ) -> Result<Vec<Record<P>>, ClientError> {
        match self.inner.codec.decode(body)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Record::from_payload(&map),
                    _ => Err(ClientError::malformed("[]", "expected object element")),
                })
                .collect(),
            _ => Err(ClientError::Decode("expected JSON array".to_string())),
        }
    }

    pub(crate) fn encode_fields(&self, fields: Map<String, Value>) -> Result<String, ClientError> {
        let bytes = self.inner.codec.encode(&Value::Object(fields))?;
        String::from_utf8(bytes).map_err(|e| ClientError::Encode(e.to_string()))
    }

    /// Routes a fresh record through its cache.
    ///
    /// If the cache was cleared since `generation` was sampled, the record
    /// is returned uncached.
    pub(crate) fn intern<P: CacheSlot>(&self, fresh: Record<P>, generation: u64) -> SharedRecord<P> {
        let mut state = self.inner.state.lock();
        if state.generation != generation {
            warn!(
                "Discarding late {} {} fetched before cache clear",
                P::KIND,
                fresh.id()
            );
            return Arc::new(RwLock::new(fresh));
        }
        P::cache(&mut state).get_or_create(fresh)
    }

    /// Refresh protocol shared by projects and profiles.
    ///
    /// Success merges into `record` only. Drift evicts the old ID unless
    /// the cache was cleared while the request was in flight.
    pub(crate) fn refresh_record<P: CacheSlot>(
        &self,
        record: &SharedRecord<P>,
        request: Request,
        required: RequiredPermission,
    ) -> Response<()> {
        let expected = record.read().id();
        let generation = self.generation();
        self.execute(request, required, |body| self.decode_record::<P>(body))
            .and_then(|fresh| {
                let mut state = self.inner.state.lock();
                if fresh.id() != expected {
                    // a cleared cache belongs to the new identity; leave it alone
                    if state.generation == generation {
                        P::cache(&mut state).evict(expected);
                    }
                    warn!(
                        "{} {} drifted: name now resolves to {}",
                        P::KIND,
                        expected,
                        fresh.id()
                    );
                    return Outcome::IdentityDrift {
                        expected,
                        found: fresh.id(),
                    };
                }
                record.write().merge(fresh);
                Outcome::Success(())
            })
    }

    /// Removes `id` from the cache of kind `P`.
    pub(crate) fn evict<P: CacheSlot>(&self, id: CanonicalId) -> bool {
        let evicted = P::cache(&mut self.inner.state.lock()).evict(id);
        if evicted {
            debug!("Evicted {} {}", P::KIND, id);
        }
        evicted
    }
}

/// Upgrades an entity's back-reference.
pub(crate) fn upgrade(session: &Weak<SessionInner>) -> Result<Session, ClientError> {
    session
        .upgrade()
        .map(Session::from_inner)
        .ok_or(ClientError::SessionClosed)
}

fn decode_ticket(body: &[u8]) -> Result<AuthTicket, ClientError> {
    let text = std::str::from_utf8(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    AuthTicket::parse(text).map_err(|e| ClientError::Decode(e.to_string()))
}
