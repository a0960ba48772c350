//! Configuration values.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default service address.
pub const DEFAULT_HOST: &str = "http://localhost:8080";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for one [`Session`](crate::Session).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address of the service, without a trailing slash.
    pub host: String,

    /// Global timeout applied to every request, in seconds.
    pub timeout_secs: u64,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("sadstate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another layer into this one.
    ///
    /// Only values that differ from the defaults override.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.host != default.host {
            self.host.clone_from(&other.host);
        }
        if other.timeout_secs != default.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
        if other.user_agent != default.user_agent {
            self.user_agent.clone_from(&other.user_agent);
        }
    }
}
