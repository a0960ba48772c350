//! Client configuration with hierarchical layering.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────────┐
//! │  1. Environment Variables (SADSTATE_*)       │  Runtime override
//! ├──────────────────────────────────────────────┤
//! │  2. Project Config (.sadstate/config.toml)   │  Project-specific
//! ├──────────────────────────────────────────────┤
//! │  3. Global Config (~/.sadstate/config.toml)  │  User defaults
//! ├──────────────────────────────────────────────┤
//! │  4. Default Values (compile-time)            │  Fallback
//! └──────────────────────────────────────────────┘
//! ```
//!
//! CLI flags are applied on top through a [`ConfigResolver`].
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `SADSTATE_HOST` | `host` | String |
//! | `SADSTATE_TIMEOUT_SECS` | `timeout_secs` | u64, at least 1 |
//! | `SADSTATE_USER_AGENT` | `user_agent` | String |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.sadstate/config.toml
//! host = "https://club.example.org"
//! timeout_secs = 10
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::ClientConfig;

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".sadstate")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".sadstate";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
