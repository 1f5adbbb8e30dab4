//! Test harness utilities for the operator bootstrap suites.

mod config_loader;
mod factories;
mod reporter;
mod world;

pub use config_loader::{DocumentConfigLoader, VALID_DOCUMENT};
pub use factories::{FactoryCall, STUB_FINGERPRINT, StubCollaborators};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
