//! Test doubles for code built on [`Session`](crate::Session).
//!
//! [`ScriptedTransport`] replays queued replies in order and records
//! every request it receives, so tests can drive a session without a
//! server:
//!
//! ```
//! use sadstate_client::testing::{entity_json, ScriptedTransport};
//! use sadstate_client::Session;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(ScriptedTransport::new());
//! let session = Session::with_transport("http://club.test", transport.clone());
//!
//! transport.reply_json(200, &entity_json(42, "robotics"));
//! let project = session.get_project("robotics").into_result().expect("scripted 200");
//!
//! assert_eq!(project.name(), "robotics");
//! assert_eq!(transport.requests()[0].url, "http://club.test/project/get?name=robotics");
//! ```

use crate::transport::{RawResponse, Request, Transport, TransportError, TransportErrorKind};
use parking_lot::Mutex;
use sadstate_types::CanonicalId;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;

type Hook = Box<dyn FnOnce() + Send>;

struct Scripted {
    result: Result<RawResponse, TransportError>,
    hook: Option<Hook>,
}

/// A [`Transport`] that answers from a script.
///
/// When the script runs dry every further request fails with a
/// `network` transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    log: Mutex<Vec<Request>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("pending", &self.pending())
            .field("sent", &self.log.lock().len())
            .finish()
    }
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply with a raw body.
    pub fn reply(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.push(Ok(RawResponse::new(status, body)), None);
    }

    /// Queues a reply with a JSON body.
    pub fn reply_json(&self, status: u16, body: &Value) {
        self.reply(status, body.to_string());
    }

    /// Queues a reply; `hook` runs after the request is received and
    /// before the reply is returned, simulating work done by another
    /// caller while the request is in flight.
    pub fn reply_with(&self, status: u16, body: impl Into<Vec<u8>>, hook: impl FnOnce() + Send + 'static) {
        self.push(Ok(RawResponse::new(status, body)), Some(Box::new(hook)));
    }

    /// Queues a transport failure.
    pub fn fail(&self, kind: TransportErrorKind, message: &str) {
        self.push(Err(TransportError::new(kind, message)), None);
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().clone()
    }

    /// Number of queued replies not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.script.lock().len()
    }

    fn push(&self, result: Result<RawResponse, TransportError>, hook: Option<Hook>) {
        self.script.lock().push_back(Scripted { result, hook });
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        self.log.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        match next {
            Some(Scripted { result, hook }) => {
                if let Some(hook) = hook {
                    hook();
                }
                result
            }
            None => Err(TransportError::new(
                TransportErrorKind::Network,
                format!("no scripted reply for {} {}", request.method, request.url),
            )),
        }
    }
}

/// Entity payload with an empty permission table.
#[must_use]
pub fn entity_json(id: i64, name: &str) -> Value {
    entity_json_with(id, name, &[])
}

/// Entity payload granting `bits` to each listed peer.
#[must_use]
pub fn entity_json_with(id: i64, name: &str, permissions: &[(i64, u32)]) -> Value {
    let table: Map<String, Value> = permissions
        .iter()
        .map(|(ticket, bits)| (ticket.to_string(), Value::from(*bits)))
        .collect();
    json!({
        "id": CanonicalId::new(id).to_opaque(),
        "name": name,
        "permissions": table,
    })
}
