//! Test double for [`HealthReporter`] that records bootstrap events.

use std::sync::Mutex;

use cortex_config::ClusterConfiguration;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::identity::ClusterIdentity;
use crate::telemetry::TelemetryError;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Configuration validated.
    ConfigurationLoaded,
    /// Cloud client constructed.
    CloudClientReady,
    /// Identity derived.
    IdentityDerived(String),
    /// Telemetry started.
    TelemetryReady { enabled: bool },
    /// Telemetry failed to start.
    TelemetryUnavailable(String),
    /// Orchestration client constructed.
    OrchestrationClientReady { namespace: String, in_cluster: bool },
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed.
    BootstrapFailed { fatal: bool, message: String },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn configuration_loaded(&self, _config: &ClusterConfiguration) {
        self.record(HealthEvent::ConfigurationLoaded);
    }

    fn cloud_client_ready(&self, _region: &str, _bucket: &str) {
        self.record(HealthEvent::CloudClientReady);
    }

    fn identity_derived(&self, identity: &ClusterIdentity) {
        self.record(HealthEvent::IdentityDerived(identity.as_str().to_owned()));
    }

    fn telemetry_ready(&self, enabled: bool) {
        self.record(HealthEvent::TelemetryReady { enabled });
    }

    fn telemetry_unavailable(&self, error: &TelemetryError) {
        self.record(HealthEvent::TelemetryUnavailable(error.to_string()));
    }

    fn orchestration_client_ready(&self, namespace: &str, in_cluster: bool) {
        self.record(HealthEvent::OrchestrationClientReady {
            namespace: namespace.to_owned(),
            in_cluster,
        });
    }

    fn bootstrap_succeeded(&self, _config: &ClusterConfiguration, _identity: &ClusterIdentity) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed {
            fatal: error.is_fatal(),
            message: error.to_string(),
        });
    }
}
