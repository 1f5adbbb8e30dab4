//! Process entry point: logging setup, bootstrap, exit policy and shutdown.

use std::collections::BTreeMap;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{error, info};

use crate::bootstrap::{ClientFactories, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::cloud::{AwsClientFactory, CloudClientFactory};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::logging;
use crate::orchestration::{KubeClientFactory, OrchestrationClientFactory};
use crate::telemetry::TracingTelemetrySink;

const PROCESS_TARGET: &str = "cortex_operator::process";

/// How the operator process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Bootstrap succeeded and a shutdown signal arrived.
    Shutdown,
    /// The cloud client could not be built.
    Fatal,
    /// Configuration, identity, orchestration or signal handling failed.
    Recoverable,
    /// Logging could not be configured.
    Logging,
}

impl Termination {
    /// Process exit status for this outcome.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Shutdown => 0,
            Self::Fatal => 1,
            Self::Recoverable => 2,
            Self::Logging => 3,
        }
    }
}

impl From<Termination> for ExitCode {
    fn from(termination: Termination) -> Self {
        Self::from(termination.code())
    }
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Shutdown listener that waits for termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Runs the operator with the production collaborators.
#[must_use]
pub fn run_operator() -> ExitCode {
    if let Err(error) = logging::initialise_from_env() {
        eprintln!("cortex-operator: {error}");
        return Termination::Logging.into();
    }
    let factories = ClientFactories {
        cloud: AwsClientFactory::from_env(),
        orchestration: KubeClientFactory::from_env(),
        telemetry: Arc::new(TracingTelemetrySink),
    };
    run_operator_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &factories,
        &SystemShutdownSignal,
    )
    .into()
}

/// Runs the bootstrap and maps its outcome onto the exit policy.
pub(crate) fn run_operator_with<C, K>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    factories: &ClientFactories<C, K>,
    shutdown: &dyn ShutdownSignal,
) -> Termination
where
    C: CloudClientFactory,
    K: OrchestrationClientFactory,
{
    let context = match bootstrap_with(loader, reporter, factories) {
        Ok(context) => context,
        Err(error) if error.is_fatal() => {
            eprintln!("error: {error}");
            return Termination::Fatal;
        }
        Err(_) => return Termination::Recoverable,
    };

    info!(
        target: PROCESS_TARGET,
        cluster_id = %context.identity(),
        "operator ready; waiting for shutdown signal"
    );
    context
        .telemetry()
        .record_event("operator.ready", BTreeMap::new());

    match shutdown.wait() {
        Ok(()) => {
            info!(target: PROCESS_TARGET, "shutdown sequence completed");
            Termination::Shutdown
        }
        Err(source) => {
            error!(target: PROCESS_TARGET, error = %source, "shutdown listener failed");
            Termination::Recoverable
        }
    }
}
