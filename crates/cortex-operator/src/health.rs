//! Structured health reporting for operator bootstrap events.

use std::sync::Arc;

use cortex_config::ClusterConfiguration;

use crate::bootstrap::BootstrapError;
use crate::identity::ClusterIdentity;
use crate::telemetry::TelemetryError;

const HEALTH_TARGET: &str = "cortex_operator::health";

/// Observer trait used to surface bootstrap progress.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once the configuration validated.
    fn configuration_loaded(&self, config: &ClusterConfiguration);

    /// Invoked once the cloud client is constructed.
    fn cloud_client_ready(&self, region: &str, bucket: &str);

    /// Invoked once the cluster identity is derived.
    fn identity_derived(&self, identity: &ClusterIdentity);

    /// Invoked after telemetry starts, whether enabled or not.
    fn telemetry_ready(&self, enabled: bool);

    /// Invoked when telemetry could not start. Bootstrap continues.
    fn telemetry_unavailable(&self, error: &TelemetryError);

    /// Invoked once the orchestration client is constructed.
    fn orchestration_client_ready(&self, namespace: &str, in_cluster: bool);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &ClusterConfiguration, identity: &ClusterIdentity);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn configuration_loaded(&self, config: &ClusterConfiguration) {
        (**self).configuration_loaded(config);
    }

    fn cloud_client_ready(&self, region: &str, bucket: &str) {
        (**self).cloud_client_ready(region, bucket);
    }

    fn identity_derived(&self, identity: &ClusterIdentity) {
        (**self).identity_derived(identity);
    }

    fn telemetry_ready(&self, enabled: bool) {
        (**self).telemetry_ready(enabled);
    }

    fn telemetry_unavailable(&self, error: &TelemetryError) {
        (**self).telemetry_unavailable(error);
    }

    fn orchestration_client_ready(&self, namespace: &str, in_cluster: bool) {
        (**self).orchestration_client_ready(namespace, in_cluster);
    }

    fn bootstrap_succeeded(&self, config: &ClusterConfiguration, identity: &ClusterIdentity) {
        (**self).bootstrap_succeeded(config, identity);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Default reporter that records bootstrap events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting operator bootstrap"
        );
    }

    fn configuration_loaded(&self, config: &ClusterConfiguration) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "configuration_loaded",
            cluster_name = %config.cluster_name(),
            region = %config.region(),
            instance_type = %config.instance_type(),
            in_cluster = config.operator_in_cluster(),
            api_version = %config.api_version(),
            "cluster configuration loaded"
        );
    }

    fn cloud_client_ready(&self, region: &str, bucket: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "cloud_client_ready",
            region,
            bucket,
            "cloud client ready"
        );
    }

    fn identity_derived(&self, identity: &ClusterIdentity) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "identity_derived",
            cluster_id = %identity,
            "cluster identity derived"
        );
    }

    fn telemetry_ready(&self, enabled: bool) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "telemetry_ready",
            enabled,
            "telemetry channel started"
        );
    }

    fn telemetry_unavailable(&self, error: &TelemetryError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "telemetry_unavailable",
            error = %error,
            "telemetry disabled after initialisation failure"
        );
    }

    fn orchestration_client_ready(&self, namespace: &str, in_cluster: bool) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "orchestration_client_ready",
            namespace,
            in_cluster,
            "orchestration client ready"
        );
    }

    fn bootstrap_succeeded(&self, config: &ClusterConfiguration, identity: &ClusterIdentity) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            cluster_name = %config.cluster_name(),
            cluster_id = %identity,
            "operator bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            fatal = error.is_fatal(),
            error = %error,
            "operator bootstrap failed"
        );
    }
}
