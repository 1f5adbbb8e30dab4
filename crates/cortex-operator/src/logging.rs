//! Structured logging for the operator process.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use ortho_config::OrthoError;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use cortex_config::{LogFormat, LogSettings};

static LOGGING_GUARD: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The logging variables could not be loaded, for example an unknown
    /// format.
    #[error("failed to load log settings: {0}")]
    Settings(Arc<OrthoError>),
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Reads [`LogSettings`] from the environment and installs the subscriber.
///
/// # Errors
///
/// See [`initialise`].
pub fn initialise_from_env() -> Result<(), LoggingError> {
    let settings = LogSettings::from_env().map_err(LoggingError::Settings)?;
    initialise(&settings)
}

/// Installs the global tracing subscriber on the first call.
///
/// Later calls are no-ops.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] for an unparsable filter and
/// [`LoggingError::Subscriber`] when another subscriber is already installed.
pub fn initialise(settings: &LogSettings) -> Result<(), LoggingError> {
    LOGGING_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_| ())
}

fn build_filter(settings: &LogSettings) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(settings.filter()).map_err(|error| LoggingError::Filter(error.to_string()))
}

fn install_subscriber(settings: &LogSettings) -> Result<(), LoggingError> {
    let filter = build_filter(settings)?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stdout)
            .with_ansi(io::stdout().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::Subscriber)
}
