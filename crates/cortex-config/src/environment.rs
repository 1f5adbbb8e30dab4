//! Fields populated from the process environment rather than the file.

use std::env;
use std::ffi::OsStr;

/// Environment variable controlling whether the operator runs in-cluster.
pub const IN_CLUSTER_ENV_VAR: &str = "CORTEX_OPERATOR_IN_CLUSTER";

/// API/schema version stamped onto every loaded configuration.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Values fixed before the configuration document is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFields {
    /// API/schema version of the configuration.
    pub api_version: String,
    /// Whether the operator talks to the orchestration platform from inside
    /// the cluster.
    pub operator_in_cluster: bool,
}

impl EnvironmentFields {
    /// Captures the fields from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(parse_in_cluster(env::var_os(IN_CLUSTER_ENV_VAR).as_deref()))
    }

    /// Builds the fields with an explicit in-cluster flag.
    #[must_use]
    pub fn new(operator_in_cluster: bool) -> Self {
        Self {
            api_version: API_VERSION.to_owned(),
            operator_in_cluster,
        }
    }
}

impl Default for EnvironmentFields {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Interprets the raw in-cluster variable.
///
/// Only a value equal to `"false"` ignoring ASCII case disables in-cluster
/// mode. An absent variable, an empty one, or any other text (including
/// `"0"` and `"no"`) leaves the default of `true` in place.
#[must_use]
pub fn parse_in_cluster(value: Option<&OsStr>) -> bool {
    match value {
        Some(raw) => !raw.to_string_lossy().eq_ignore_ascii_case("false"),
        None => true,
    }
}
