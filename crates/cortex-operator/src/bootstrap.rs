//! Operator bootstrap sequence.
//!
//! Steps run strictly in order: configuration, cloud client, identity,
//! telemetry, orchestration client. The first failing step ends the sequence
//! and nothing built so far is retained.

use std::sync::Arc;

use thiserror::Error;

use cortex_config::{ClusterConfiguration, ConfigError};

use crate::cloud::{CloudClient, CloudClientError, CloudClientFactory, CloudSettings};
use crate::context::OperatorContext;
use crate::health::HealthReporter;
use crate::identity::{ClusterIdentity, IdentityError};
use crate::orchestration::{
    OrchestrationClient, OrchestrationClientError, OrchestrationClientFactory,
    OrchestrationSettings,
};
use crate::telemetry::{self, TelemetryChannel, TelemetryConfig, TelemetrySink};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads and validates the cluster configuration.
    fn load(&self) -> Result<ClusterConfiguration, ConfigError>;
}

/// Loader that delegates to [`ClusterConfiguration::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<ClusterConfiguration, ConfigError> {
        ClusterConfiguration::load()
    }
}

/// Loader returning an already validated configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: ClusterConfiguration,
}

impl StaticConfigLoader {
    /// Wraps a configuration.
    #[must_use]
    pub fn new(config: ClusterConfiguration) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<ClusterConfiguration, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be read or failed validation.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// The cloud client could not be built. The process must terminate.
    #[error("failed to create cloud client: {source}")]
    Cloud {
        /// Underlying factory error.
        #[source]
        source: CloudClientError,
    },
    /// The cluster identity could not be derived.
    #[error("failed to derive cluster identity: {source}")]
    Identity {
        /// Underlying derivation error.
        #[source]
        source: IdentityError,
    },
    /// The orchestration client could not be built.
    #[error("failed to create orchestration client: {source}")]
    Orchestration {
        /// Underlying factory error.
        #[source]
        source: OrchestrationClientError,
    },
}

impl BootstrapError {
    /// Whether the error must terminate the process.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cloud { .. })
    }
}

/// Collaborators that construct the operator's external clients.
pub struct ClientFactories<C, K> {
    /// Cloud client factory.
    pub cloud: C,
    /// Orchestration client factory.
    pub orchestration: K,
    /// Destination for telemetry records.
    pub telemetry: Arc<dyn TelemetrySink>,
}

/// Bootstraps the operator using the supplied collaborators.
///
/// # Errors
///
/// Returns the first failing step's error. Telemetry failures are reported to
/// `reporter` and never fail the bootstrap.
pub fn bootstrap_with<C, K>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    factories: &ClientFactories<C, K>,
) -> Result<OperatorContext<C::Client, K::Client>, BootstrapError>
where
    C: CloudClientFactory,
    K: OrchestrationClientFactory,
{
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    reporter.configuration_loaded(&config);

    let cloud = factories
        .cloud
        .create(&CloudSettings::from_config(&config))
        .map_err(|source| fail(BootstrapError::Cloud { source }))?;
    reporter.cloud_client_ready(cloud.region(), cloud.bucket());

    let fingerprint = cloud.hashed_account_id();
    let identity = ClusterIdentity::for_cluster(&config, fingerprint)
        .map_err(|source| fail(BootstrapError::Identity { source }))?;
    reporter.identity_derived(&identity);

    let telemetry_config =
        TelemetryConfig::for_cluster(config.telemetry(), fingerprint.unwrap_or_default(), &identity);
    let telemetry = match telemetry::initialise(telemetry_config, Arc::clone(&factories.telemetry))
    {
        Ok(channel) => {
            reporter.telemetry_ready(channel.is_enabled());
            channel
        }
        Err(error) => {
            reporter.telemetry_unavailable(&error);
            TelemetryChannel::disabled()
        }
    };

    let orchestration = factories
        .orchestration
        .create(&OrchestrationSettings::from_config(&config))
        .map_err(|source| fail(BootstrapError::Orchestration { source }))?;
    reporter.orchestration_client_ready(orchestration.namespace(), orchestration.in_cluster());

    reporter.bootstrap_succeeded(&config, &identity);
    Ok(OperatorContext::new(
        config,
        identity,
        cloud,
        orchestration,
        telemetry,
    ))
}
