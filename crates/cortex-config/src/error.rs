use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::validation::Violations;

/// Errors raised while loading the cluster configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read cluster configuration '{path}': {source}")]
    Unreadable {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The document was read but failed validation.
    #[error("invalid cluster configuration: {0}")]
    Invalid(Violations),
}

impl ConfigError {
    /// Returns the violations when the document failed validation.
    #[must_use]
    pub const fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Invalid(violations) => Some(violations),
            Self::Unreadable { .. } => None,
        }
    }
}
