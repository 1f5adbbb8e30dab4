//! Client factories and telemetry sink that record calls and support
//! injected failures.

use std::sync::{Arc, Mutex};

use crate::bootstrap::ClientFactories;
use crate::cloud::{CloudClient, CloudClientError, CloudClientFactory, CloudSettings};
use crate::orchestration::{
    OrchestrationClient, OrchestrationClientError, OrchestrationClientFactory,
    OrchestrationSettings,
};
use crate::telemetry::{TelemetryConfig, TelemetryError, TelemetryRecord, TelemetrySink};

/// Fingerprint reported by the stub cloud client.
pub const STUB_FINGERPRINT: &str = "abc";

/// Collaborator invocations, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryCall {
    /// Cloud factory invoked with these settings.
    Cloud(CloudSettings),
    /// Telemetry sink opened.
    TelemetryOpen,
    /// Orchestration factory invoked with these settings.
    Orchestration(OrchestrationSettings),
}

#[derive(Debug, Default)]
struct CollaboratorState {
    calls: Vec<FactoryCall>,
    cloud_failure: Option<String>,
    omit_fingerprint: bool,
    telemetry_failure: Option<String>,
    orchestration_failure: Option<String>,
    records: Vec<TelemetryRecord>,
}

/// Shared handle over every stub collaborator.
#[derive(Debug, Clone, Default)]
pub struct StubCollaborators {
    state: Arc<Mutex<CollaboratorState>>,
}

impl StubCollaborators {
    fn with_state<R>(&self, action: impl FnOnce(&mut CollaboratorState) -> R) -> R {
        let mut state = self.state.lock().expect("collaborator state mutex poisoned");
        action(&mut state)
    }

    /// Makes the cloud factory fail.
    pub fn fail_cloud(&self, message: impl Into<String>) {
        let message = message.into();
        self.with_state(|state| state.cloud_failure = Some(message));
    }

    /// Makes the cloud client report no account fingerprint.
    pub fn omit_fingerprint(&self) {
        self.with_state(|state| state.omit_fingerprint = true);
    }

    /// Makes the telemetry sink refuse to open.
    pub fn fail_telemetry(&self, message: impl Into<String>) {
        let message = message.into();
        self.with_state(|state| state.telemetry_failure = Some(message));
    }

    /// Makes the orchestration factory fail.
    pub fn fail_orchestration(&self, message: impl Into<String>) {
        let message = message.into();
        self.with_state(|state| state.orchestration_failure = Some(message));
    }

    /// Recorded collaborator calls.
    #[must_use]
    pub fn calls(&self) -> Vec<FactoryCall> {
        self.with_state(|state| state.calls.clone())
    }

    /// Records delivered to the telemetry sink.
    #[must_use]
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.with_state(|state| state.records.clone())
    }

    /// Builds the factory bundle passed to the bootstrap.
    #[must_use]
    pub fn factories(&self) -> ClientFactories<StubCloudFactory, StubOrchestrationFactory> {
        ClientFactories {
            cloud: StubCloudFactory(self.clone()),
            orchestration: StubOrchestrationFactory(self.clone()),
            telemetry: Arc::new(StubTelemetrySink(self.clone())),
        }
    }
}

/// Cloud factory backed by [`StubCollaborators`].
#[derive(Debug, Clone)]
pub struct StubCloudFactory(StubCollaborators);

/// Client produced by [`StubCloudFactory`].
#[derive(Debug, Clone)]
pub struct StubCloudClient {
    region: String,
    bucket: String,
    fingerprint: Option<String>,
}

impl CloudClient for StubCloudClient {
    fn region(&self) -> &str {
        &self.region
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn hashed_account_id(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }
}

impl CloudClientFactory for StubCloudFactory {
    type Client = StubCloudClient;

    fn create(&self, settings: &CloudSettings) -> Result<StubCloudClient, CloudClientError> {
        let (failure, omit) = self.0.with_state(|state| {
            state.calls.push(FactoryCall::Cloud(settings.clone()));
            (state.cloud_failure.clone(), state.omit_fingerprint)
        });
        if let Some(message) = failure {
            return Err(CloudClientError::unavailable(message));
        }
        Ok(StubCloudClient {
            region: settings.region.clone(),
            bucket: settings.bucket.clone(),
            fingerprint: (!omit).then(|| STUB_FINGERPRINT.to_owned()),
        })
    }
}

/// Orchestration factory backed by [`StubCollaborators`].
#[derive(Debug, Clone)]
pub struct StubOrchestrationFactory(StubCollaborators);

/// Client produced by [`StubOrchestrationFactory`].
#[derive(Debug, Clone)]
pub struct StubOrchestrationClient {
    settings: OrchestrationSettings,
}

impl OrchestrationClient for StubOrchestrationClient {
    fn namespace(&self) -> &str {
        &self.settings.namespace
    }

    fn in_cluster(&self) -> bool {
        self.settings.in_cluster
    }
}

impl OrchestrationClientFactory for StubOrchestrationFactory {
    type Client = StubOrchestrationClient;

    fn create(
        &self,
        settings: &OrchestrationSettings,
    ) -> Result<StubOrchestrationClient, OrchestrationClientError> {
        let failure = self.0.with_state(|state| {
            state.calls.push(FactoryCall::Orchestration(settings.clone()));
            state.orchestration_failure.clone()
        });
        match failure {
            Some(message) => Err(OrchestrationClientError::Unavailable { message }),
            None => Ok(StubOrchestrationClient {
                settings: settings.clone(),
            }),
        }
    }
}

#[derive(Debug)]
struct StubTelemetrySink(StubCollaborators);

impl TelemetrySink for StubTelemetrySink {
    fn open(&self, _config: &TelemetryConfig) -> Result<(), TelemetryError> {
        let failure = self.0.with_state(|state| {
            state.calls.push(FactoryCall::TelemetryOpen);
            state.telemetry_failure.clone()
        });
        match failure {
            Some(message) => Err(TelemetryError::SinkUnavailable { message }),
            None => Ok(()),
        }
    }

    fn send(&self, record: &TelemetryRecord) {
        let record = record.clone();
        self.0.with_state(|state| state.records.push(record));
    }
}
