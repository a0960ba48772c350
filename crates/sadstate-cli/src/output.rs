//! JSON rendering of command results.
//!
//! Every command prints exactly one document:
//!
//! ```text
//! { "status": 200, "outcome": "success", "result": { ... } }
//! ```
//!
//! `detail` carries the failure reason for non-success outcomes and
//! `result` is omitted unless the outcome is a success.

use sadstate_client::record::encode_permissions;
use sadstate_client::{Profile, Project, Response, ResponseSummary};
use serde_json::{json, Value};

/// Builds the output document for `response`, rendering the success
/// payload with `render`.
pub fn document<T>(response: &Response<T>, render: impl FnOnce(&T) -> Value) -> Value {
    let summary = ResponseSummary::from(response);
    let mut doc = json!({
        "status": summary.status,
        "outcome": summary.outcome,
    });
    if let Some(detail) = summary.detail {
        doc["detail"] = Value::String(detail);
    }
    if let Some(payload) = response.success() {
        doc["result"] = render(payload);
    }
    doc
}

pub fn project(project: &Project) -> Value {
    json!({
        "id": project.id().get(),
        "opaque_id": project.id().to_opaque(),
        "name": project.name(),
        "permissions": encode_permissions(&project.permissions()),
    })
}

pub fn profile(profile: &Profile) -> Value {
    json!({
        "id": profile.id().get(),
        "opaque_id": profile.id().to_opaque(),
        "name": profile.name(),
        "project": profile.project().name(),
        "permissions": encode_permissions(&profile.permissions()),
    })
}

/// Profile content; text when it is valid UTF-8, a byte array otherwise.
pub fn content(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => json!({ "size": bytes.len(), "text": text }),
        Err(_) => json!({ "size": bytes.len(), "bytes": bytes }),
    }
}
