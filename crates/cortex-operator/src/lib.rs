//! Startup bootstrap for the Cortex cluster operator.
//!
//! The operator cannot serve anything until its configuration is validated
//! and its cloud and orchestration clients exist. [`bootstrap_with`] runs that
//! sequence once and hands back an [`OperatorContext`] that every other
//! subsystem reads from.
//!
//! Failures are classified rather than handled in place. A cloud client
//! failure is fatal ([`BootstrapError::is_fatal`]) and only [`run_operator`]
//! turns it into process termination. Configuration, identity and
//! orchestration failures are returned to the caller. Telemetry is best
//! effort: when it cannot start, the health reporter logs a warning and the
//! context carries a disabled channel.

mod bootstrap;
pub mod cloud;
mod context;
mod health;
mod identity;
pub mod logging;
pub mod orchestration;
mod process;
pub mod telemetry;

pub use bootstrap::{
    BootstrapError, ClientFactories, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use context::OperatorContext;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use identity::{ClusterIdentity, IdentityError};
pub use process::{ShutdownError, ShutdownSignal, SystemShutdownSignal, Termination, run_operator};

#[cfg(test)]
mod tests;
