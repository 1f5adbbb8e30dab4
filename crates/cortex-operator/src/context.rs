//! Process-wide state assembled by the bootstrap.

use cortex_config::ClusterConfiguration;

use crate::identity::ClusterIdentity;
use crate::telemetry::TelemetryChannel;

/// Configuration and clients shared by every operator subsystem.
///
/// Built once by [`crate::bootstrap_with`] after every step succeeded and
/// read-only thereafter.
#[derive(Debug)]
pub struct OperatorContext<C, K> {
    config: ClusterConfiguration,
    identity: ClusterIdentity,
    cloud: C,
    orchestration: K,
    telemetry: TelemetryChannel,
}

impl<C, K> OperatorContext<C, K> {
    pub(crate) fn new(
        config: ClusterConfiguration,
        identity: ClusterIdentity,
        cloud: C,
        orchestration: K,
        telemetry: TelemetryChannel,
    ) -> Self {
        Self {
            config,
            identity,
            cloud,
            orchestration,
            telemetry,
        }
    }

    /// Validated cluster configuration.
    #[must_use]
    pub fn config(&self) -> &ClusterConfiguration {
        &self.config
    }

    /// Derived cluster identity.
    #[must_use]
    pub fn identity(&self) -> &ClusterIdentity {
        &self.identity
    }

    /// Cloud-provider client.
    #[must_use]
    pub fn cloud(&self) -> &C {
        &self.cloud
    }

    /// Orchestration-platform client.
    #[must_use]
    pub fn orchestration(&self) -> &K {
        &self.orchestration
    }

    /// Telemetry channel; disabled when telemetry is off or failed to start.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryChannel {
        &self.telemetry
    }
}
