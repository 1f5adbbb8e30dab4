//! BDD test world: loader, collaborators, reporter and bootstrap outcome.

use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, bootstrap_with};
use crate::context::OperatorContext;

use super::config_loader::DocumentConfigLoader;
use super::factories::{StubCloudClient, StubCollaborators, StubOrchestrationClient};
use super::reporter::RecordingHealthReporter;

type StubContext = OperatorContext<StubCloudClient, StubOrchestrationClient>;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: DocumentConfigLoader,
    pub collaborators: StubCollaborators,
    pub reporter: Arc<RecordingHealthReporter>,
    outcome: Option<Result<StubContext, BootstrapError>>,
}

impl TestWorld {
    /// Builds a world around the valid document and healthy collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: DocumentConfigLoader::valid(),
            collaborators: StubCollaborators::default(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            outcome: None,
        }
    }

    /// Replaces the configuration loader.
    pub fn use_loader(&mut self, loader: DocumentConfigLoader) {
        self.loader = loader;
        self.outcome = None;
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let factories = self.collaborators.factories();
        self.outcome = Some(bootstrap_with(
            &self.loader,
            self.reporter.clone(),
            &factories,
        ));
    }

    /// Context produced by a successful bootstrap.
    #[must_use]
    pub fn context(&self) -> Option<&StubContext> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Error produced by a failed bootstrap.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.outcome
            .as_ref()
            .and_then(|outcome| outcome.as_ref().err())
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
