//! Locates and reads the cluster configuration document.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV_VAR: &str = "CORTEX_CLUSTER_CONFIG_PATH";

/// Location of the configuration file mounted into the operator pod.
pub const DEFAULT_CONFIG_PATH: &str = "/configs/cluster/cluster.yaml";

/// Picks the override when it is present and non-empty, else the default.
#[must_use]
pub fn resolve_config_path(override_path: Option<OsString>) -> PathBuf {
    match override_path {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Where the raw configuration bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    path: PathBuf,
}

impl ConfigSource {
    /// Resolves the source from [`CONFIG_PATH_ENV_VAR`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(resolve_config_path(env::var_os(CONFIG_PATH_ENV_VAR)))
    }

    /// Uses an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the source reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Reads the raw document without interpreting it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] when the file is missing or cannot
    /// be read.
    pub fn read(&self) -> Result<Vec<u8>, ConfigError> {
        fs::read(&self.path).map_err(|source| ConfigError::Unreadable {
            path: self.path.clone(),
            source,
        })
    }
}
