//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.sadstate/config.toml`)
//! 3. Project config (`.sadstate/config.toml`)
//! 4. Environment variables (`SADSTATE_*`)
//!
//! Each layer overrides the previous.

use super::{default_config_path, ClientConfig, ConfigError, PROJECT_CONFIG_DIR, PROJECT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use sadstate_client::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/path/to/project")
///     .load()
///     .expect("valid config");
/// println!("talking to {}", config.host);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.sadstate/config.toml).
    global_config_path: Option<PathBuf>,

    /// Project root directory.
    project_root: Option<PathBuf>,

    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Project config will be loaded from `<project_root>/.sadstate/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any config file exists but cannot be
    /// read or parsed, or an environment variable is malformed. Missing
    /// config files are silently ignored.
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::default();

        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global_config) = load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                config.merge(&global_config);
            }
        }

        if !self.skip_project {
            if let Some(ref project_root) = self.project_root {
                let project_config_path = project_root
                    .join(PROJECT_CONFIG_DIR)
                    .join(PROJECT_CONFIG_FILE);

                if let Some(project_config) = load_file(&project_config_path)? {
                    debug!(path = %project_config_path.display(), "Loaded project config");
                    config.merge(&project_config);
                }
            }
        }

        if !self.skip_env {
            apply_env_vars(&mut config)?;
        }

        Ok(config)
    }
}

/// Loads a config file, returning None if it doesn't exist.
fn load_file(path: &Path) -> Result<Option<ClientConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let config =
        ClientConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;
    if config.timeout_secs == 0 {
        return Err(ConfigError::invalid_value(
            path,
            "timeout_secs",
            "must be at least 1 second",
        ));
    }

    Ok(Some(config))
}

fn apply_env_vars(config: &mut ClientConfig) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var("SADSTATE_HOST") {
        config.host = val;
    }

    if let Ok(val) = std::env::var("SADSTATE_TIMEOUT_SECS") {
        config.timeout_secs = parse_timeout("SADSTATE_TIMEOUT_SECS", &val)?;
    }

    if let Ok(val) = std::env::var("SADSTATE_USER_AGENT") {
        config.user_agent = val;
    }

    Ok(())
}

/// A zero timeout would fail every request immediately.
fn parse_timeout(name: &str, val: &str) -> Result<u64, ConfigError> {
    match val.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid_env_var(name, "must be at least 1 second")),
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError::invalid_env_var(name, "expected integer")),
    }
}
