//! Orchestration-platform client construction.
//!
//! Unlike the cloud client, a failure here is recoverable: the bootstrap
//! returns it to the caller, which decides whether to retry or exit.

mod kube;

use std::io;

use ::kube::config::{InClusterError, KubeconfigError};
use cortex_config::ClusterConfiguration;
use thiserror::Error;

pub use kube::{
    KUBECONFIG_ENV_VAR, KubeClient, KubeClientFactory, SERVICE_HOST_ENV_VAR, SERVICE_PORT_ENV_VAR,
};

/// Namespace the operator manages.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Inputs required to build an orchestration client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationSettings {
    /// Namespace the client is scoped to.
    pub namespace: String,
    /// Whether to use in-cluster service-account credentials.
    pub in_cluster: bool,
}

impl OrchestrationSettings {
    /// Scopes the client to [`DEFAULT_NAMESPACE`] using the configured mode.
    #[must_use]
    pub fn from_config(config: &ClusterConfiguration) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            in_cluster: config.operator_in_cluster(),
        }
    }
}

/// Capabilities the rest of the operator needs from an orchestration client.
pub trait OrchestrationClient {
    /// Namespace the client is scoped to.
    fn namespace(&self) -> &str;

    /// Whether the client uses in-cluster credentials.
    fn in_cluster(&self) -> bool;
}

/// Builds orchestration clients.
pub trait OrchestrationClientFactory {
    /// Client type produced by the factory.
    type Client: OrchestrationClient;

    /// Constructs a client for the supplied settings.
    fn create(&self, settings: &OrchestrationSettings)
    -> Result<Self::Client, OrchestrationClientError>;
}

/// Errors reported while constructing an orchestration client.
#[derive(Debug, Error)]
pub enum OrchestrationClientError {
    /// In-cluster settings could not be resolved, for example outside a pod.
    #[error("failed to resolve in-cluster configuration: {source}")]
    InCluster {
        /// Underlying resolution error.
        #[source]
        source: InClusterError,
    },
    /// The kubeconfig could not be read, merged or resolved.
    #[error("failed to resolve kubeconfig: {source}")]
    Kubeconfig {
        /// Underlying kubeconfig error.
        #[source]
        source: KubeconfigError,
    },
    /// The runtime used to resolve credentials could not start.
    #[error("failed to start kubeconfig resolver: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The API server address was not a valid URL.
    #[error("invalid API server endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        /// Offending endpoint text.
        endpoint: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Any other construction failure.
    #[error("orchestration client unavailable: {message}")]
    Unavailable {
        /// Human-readable description.
        message: String,
    },
}
