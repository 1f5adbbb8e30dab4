//! Kubernetes connection resolution for in-cluster and kubeconfig modes.

use std::path::PathBuf;

use kube::Config;
use kube::config::{KubeConfigOptions, Kubeconfig};
use tokio::runtime;
use url::Url;

use super::{
    OrchestrationClient, OrchestrationClientError, OrchestrationClientFactory,
    OrchestrationSettings,
};

/// Environment variable naming the API server host inside a pod.
pub const SERVICE_HOST_ENV_VAR: &str = "KUBERNETES_SERVICE_HOST";

/// Environment variable naming the API server port inside a pod.
pub const SERVICE_PORT_ENV_VAR: &str = "KUBERNETES_SERVICE_PORT";

/// Environment variable listing kubeconfig files. Every entry is merged.
pub const KUBECONFIG_ENV_VAR: &str = "KUBECONFIG";

const ORCHESTRATION_TARGET: &str = "cortex_operator::orchestration::kube";

/// Resolved connection to a Kubernetes API server.
///
/// Credentials stay inside the wrapped [`kube::Config`], whose `Debug` output
/// redacts secrets.
#[derive(Debug, Clone)]
pub struct KubeClient {
    namespace: String,
    endpoint: Url,
    context: Option<String>,
    in_cluster: bool,
    config: Config,
}

impl KubeClient {
    /// API server URL.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Kubeconfig context in use. `None` in cluster.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Connection settings, scoped to [`OrchestrationClient::namespace`].
    ///
    /// Turn these into a `kube::Client` from within a Tokio runtime.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl OrchestrationClient for KubeClient {
    fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    fn in_cluster(&self) -> bool {
        self.in_cluster
    }
}

/// Factory producing [`KubeClient`] handles.
#[derive(Debug, Clone, Default)]
pub struct KubeClientFactory {
    kubeconfig: Option<PathBuf>,
}

impl KubeClientFactory {
    /// Resolves kubeconfig files the way `kubectl` does: every
    /// [`KUBECONFIG_ENV_VAR`] entry merged in order, else `~/.kube/config`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Builds a factory that reads only the given kubeconfig when out of
    /// cluster.
    #[must_use]
    pub fn with_kubeconfig(path: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: Some(path.into()),
        }
    }

    fn read_kubeconfig(&self) -> Result<Kubeconfig, OrchestrationClientError> {
        let kubeconfig = match &self.kubeconfig {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        };
        kubeconfig.map_err(|source| OrchestrationClientError::Kubeconfig { source })
    }

    fn connect_with_kubeconfig(
        &self,
    ) -> Result<(Config, Option<String>), OrchestrationClientError> {
        let kubeconfig = self.read_kubeconfig()?;
        let context = kubeconfig.current_context.clone();
        // Resolution is async only to support exec credential plugins.
        let runtime = runtime::Builder::new_current_thread()
            .build()
            .map_err(|source| OrchestrationClientError::Runtime { source })?;
        let config = runtime
            .block_on(Config::from_custom_kubeconfig(
                kubeconfig,
                &KubeConfigOptions::default(),
            ))
            .map_err(|source| OrchestrationClientError::Kubeconfig { source })?;
        Ok((config, context))
    }
}

impl OrchestrationClientFactory for KubeClientFactory {
    type Client = KubeClient;

    fn create(
        &self,
        settings: &OrchestrationSettings,
    ) -> Result<KubeClient, OrchestrationClientError> {
        let (mut config, context) = if settings.in_cluster {
            let config = Config::incluster()
                .map_err(|source| OrchestrationClientError::InCluster { source })?;
            (config, None)
        } else {
            self.connect_with_kubeconfig()?
        };
        config.default_namespace.clone_from(&settings.namespace);

        let endpoint_text = config.cluster_url.to_string();
        let endpoint = Url::parse(&endpoint_text).map_err(|source| {
            OrchestrationClientError::InvalidEndpoint {
                endpoint: endpoint_text,
                source,
            }
        })?;

        tracing::debug!(
            target: ORCHESTRATION_TARGET,
            endpoint = %endpoint,
            namespace = %settings.namespace,
            context = context.as_deref().unwrap_or("<in-cluster>"),
            in_cluster = settings.in_cluster,
            "kubernetes client resolved"
        );
        Ok(KubeClient {
            namespace: settings.namespace.clone(),
            endpoint,
            context,
            in_cluster: settings.in_cluster,
            config,
        })
    }
}
