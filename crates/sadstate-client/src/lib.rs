//! Client access layer for the sadstate club-management service.
//!
//! # Crate Architecture
//!
//! ```text
//! sadstate-types   (CanonicalId, AuthTicket, ErrorCode)
//!     ↓
//! sadstate-auth    (permission bitsets, RequiredPermission)
//!     ↓
//! sadstate-client  ← THIS CRATE
//!     ↓
//! sadstate-cli
//! ```
//!
//! # Data Flow
//!
//! ```text
//! caller ─▶ Session ─▶ Transport ─▶ (status, body)
//!                                       │
//!                      classify() ◀─────┘
//!                          │ 200
//!                          ▼
//!                  Codec ─▶ Record ─▶ EntityCache (get-or-create)
//!                                            │
//!                  Response<Project|Profile> ◀┘
//! ```
//!
//! Every remote operation returns a [`Response`] whose [`Outcome`] is one
//! of a closed set of variants; nothing is thrown across the session
//! boundary.
//!
//! # Example
//!
//! ```no_run
//! use sadstate_client::{ClientConfig, Outcome, Session};
//!
//! let session = Session::new(&ClientConfig::default());
//! session.new_auth("hunter2");
//!
//! match session.get_project("robotics").outcome {
//!     Outcome::Success(project) => println!("{} = {}", project.name(), project.id()),
//!     Outcome::InvalidPermission(required) => eprintln!("needs {required}"),
//!     other => eprintln!("failed: {}", other.kind()),
//! }
//! ```

pub mod cache;
pub mod codec;
pub mod config;
mod edit;
mod error;
pub mod multipart;
mod profile;
mod project;
pub mod record;
mod response;
mod session;
pub mod testing;
pub mod transport;

pub use cache::{EntityCache, EntityKind, SharedRecord};
pub use codec::{Codec, JsonCodec};
pub use config::{ClientConfig, ConfigError, ConfigLoader, ConfigResolver};
pub use edit::{Edit, ProfileEdit, ProjectEdit};
pub use error::ClientError;
pub use profile::Profile;
pub use project::Project;
pub use record::Record;
pub use response::{
    classify, Outcome, Response, ResponseError, ResponseSummary, DEFAULT_ERROR_REASON,
};
pub use session::Session;
pub use transport::{HttpTransport, Method, RawResponse, Request, Transport, TransportError};

pub use sadstate_auth::{
    CombineOp, PermissionSet, PermissionTable, ProfilePermissions, ProjectPermissions,
    RequiredPermission,
};
pub use sadstate_types::{AuthTicket, CanonicalId, ErrorCode, IdError, PeerId};
