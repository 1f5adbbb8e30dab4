//! Configuration loader that parses an in-memory document.

use cortex_config::{ClusterConfiguration, ConfigError, EnvironmentFields};

use crate::bootstrap::ConfigLoader;

/// Minimal document that passes validation.
pub const VALID_DOCUMENT: &str = "\
region: us-west-2
bucket: cortex-models
cluster_name: dev-cluster
instance_type: m5.large
telemetry: true
";

/// Loader that validates a fixed YAML document on every call.
#[derive(Debug, Clone)]
pub struct DocumentConfigLoader {
    document: String,
    environment: EnvironmentFields,
}

impl DocumentConfigLoader {
    /// Loader over the given document, in-cluster.
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            environment: EnvironmentFields::new(true),
        }
    }

    /// Loader over [`VALID_DOCUMENT`].
    #[must_use]
    pub fn valid() -> Self {
        Self::new(VALID_DOCUMENT)
    }

    /// Loader over [`VALID_DOCUMENT`] with the telemetry flag replaced.
    #[must_use]
    pub fn with_telemetry(enabled: bool) -> Self {
        Self::new(VALID_DOCUMENT.replace("telemetry: true", &format!("telemetry: {enabled}")))
    }

    /// Switches the in-cluster flag.
    #[must_use]
    pub fn out_of_cluster(mut self) -> Self {
        self.environment = EnvironmentFields::new(false);
        self
    }
}

impl ConfigLoader for DocumentConfigLoader {
    fn load(&self) -> Result<ClusterConfiguration, ConfigError> {
        ClusterConfiguration::parse(self.document.as_bytes(), self.environment.clone())
    }
}
