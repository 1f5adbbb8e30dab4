//! Cluster configuration for the Cortex operator.
//!
//! The operator reads a single YAML document describing the cluster it
//! manages. This crate resolves where that document lives, parses it, and
//! validates every field before anything downstream is allowed to see it.
//! Validation never stops at the first problem: all violations are gathered
//! into one [`ConfigError::Invalid`] so an operator can fix the whole file in a
//! single pass.
//!
//! Two fields are never read from the file. The API version is pinned to the
//! crate version, and the in-cluster flag comes from
//! [`IN_CLUSTER_ENV_VAR`]. See [`EnvironmentFields`] for the exact parsing
//! rule.

mod catalog;
mod cluster;
mod environment;
mod error;
mod logging;
mod source;
mod validation;

pub use catalog::{
    InstanceMetadata, SUPPORTED_REGIONS, instance_metadata, is_known_instance_type,
    is_supported_region,
};
pub use cluster::{
    ClusterConfiguration, DEFAULT_INSTANCE_VOLUME_SIZE, DEFAULT_MAX_INSTANCES,
    DEFAULT_MIN_INSTANCES,
};
pub use environment::{API_VERSION, EnvironmentFields, IN_CLUSTER_ENV_VAR, parse_in_cluster};
pub use error::ConfigError;
pub use logging::{
    DEFAULT_LOG_FILTER, LOG_FORMAT_ENV_VAR, LOG_LEVEL_ENV_VAR, LogFormat, LogFormatParseError,
    LogSettings,
};
pub use source::{CONFIG_PATH_ENV_VAR, ConfigSource, DEFAULT_CONFIG_PATH, resolve_config_path};
pub use validation::{Violation, ViolationKind, Violations};
