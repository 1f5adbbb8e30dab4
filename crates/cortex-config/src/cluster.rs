//! The validated cluster configuration record.

use serde_json::{Map, Value};

use crate::catalog::{self, InstanceMetadata};
use crate::environment::EnvironmentFields;
use crate::error::ConfigError;
use crate::source::ConfigSource;
use crate::validation::{self, ViolationKind, Violations};

/// Lower autoscaling bound used when the file leaves it unset.
pub const DEFAULT_MIN_INSTANCES: u64 = 1;

/// Upper autoscaling bound used when the file leaves it unset.
pub const DEFAULT_MAX_INSTANCES: u64 = 5;

/// Root volume size in GiB used when the file leaves it unset.
pub const DEFAULT_INSTANCE_VOLUME_SIZE: u64 = 50;

const VOLUME_SIZE_RANGE: std::ops::RangeInclusive<u64> = 20..=16_384;

const ENVIRONMENT_KEYS: &[&str] = &["api_version", "operator_in_cluster"];

/// Cluster description shared by every operator subsystem.
///
/// Instances only exist once every field has passed validation, and the
/// record exposes no mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfiguration {
    api_version: String,
    operator_in_cluster: bool,
    region: String,
    bucket: String,
    cluster_name: String,
    instance_type: String,
    telemetry: bool,
    min_instances: u64,
    max_instances: u64,
    instance_volume_size: u64,
    log_group: String,
    instance_metadata: InstanceMetadata,
}

impl ClusterConfiguration {
    /// Loads the configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] when the resolved file cannot be
    /// read and [`ConfigError::Invalid`] with every violation otherwise.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&ConfigSource::from_env(), EnvironmentFields::from_env())
    }

    /// Loads the configuration from an explicit source.
    ///
    /// # Errors
    ///
    /// See [`ClusterConfiguration::load`].
    pub fn load_from(
        source: &ConfigSource,
        environment: EnvironmentFields,
    ) -> Result<Self, ConfigError> {
        let bytes = source.read()?;
        Self::parse(&bytes, environment)
    }

    /// Parses and validates a raw YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] carrying every violation found.
    pub fn parse(bytes: &[u8], environment: EnvironmentFields) -> Result<Self, ConfigError> {
        let document = match parse_document(bytes) {
            Ok(document) => document,
            Err(reason) => {
                let mut violations = Violations::new();
                violations.push("document", ViolationKind::Malformed { reason });
                return Err(ConfigError::Invalid(violations));
            }
        };

        let mut reader = FieldReader::new(document);
        let region = reader
            .required_string("region")
            .and_then(|region| reader.check("region", region, check_region));
        let bucket = reader
            .required_string("bucket")
            .and_then(|bucket| reader.check("bucket", bucket, validation::check_bucket_name));
        let cluster_name = reader
            .required_string("cluster_name")
            .and_then(|name| reader.check("cluster_name", name, validation::check_cluster_name));
        let instance_type = reader.required_string("instance_type").and_then(|value| {
            reader.check("instance_type", value, validation::check_instance_type_format)
        });
        let telemetry = reader.required_bool("telemetry");
        let min_instances = reader
            .optional_u64("min_instances")
            .unwrap_or(DEFAULT_MIN_INSTANCES);
        let max_instances = reader
            .optional_u64("max_instances")
            .unwrap_or(DEFAULT_MAX_INSTANCES);
        let instance_volume_size = reader
            .optional_u64("instance_volume_size")
            .unwrap_or(DEFAULT_INSTANCE_VOLUME_SIZE);
        let log_group = reader
            .optional_string("log_group")
            .and_then(|group| reader.check("log_group", group, validation::check_log_group));

        if max_instances == 0 {
            reader.invalid("max_instances", String::from("must be at least 1"));
        } else if min_instances > max_instances {
            reader.invalid(
                "max_instances",
                format!("must be greater than or equal to min_instances ({min_instances})"),
            );
        }
        if !VOLUME_SIZE_RANGE.contains(&instance_volume_size) {
            reader.invalid(
                "instance_volume_size",
                format!(
                    "must be between {} and {} GiB",
                    VOLUME_SIZE_RANGE.start(),
                    VOLUME_SIZE_RANGE.end()
                ),
            );
        }

        let instance_metadata = match (&region, &instance_type) {
            (Some(region), Some(instance_type)) => {
                let metadata = catalog::instance_metadata(region, instance_type);
                if metadata.is_none() {
                    let reason = if catalog::is_known_instance_type(instance_type) {
                        format!("'{instance_type}' is not offered in region '{region}'")
                    } else {
                        format!("unknown instance type '{instance_type}'")
                    };
                    reader.invalid("instance_type", reason);
                }
                metadata
            }
            _ => None,
        };

        let violations = reader.finish();
        match (
            region,
            bucket,
            cluster_name,
            instance_type,
            telemetry,
            instance_metadata,
        ) {
            (
                Some(region),
                Some(bucket),
                Some(cluster_name),
                Some(instance_type),
                Some(telemetry),
                Some(instance_metadata),
            ) if violations.is_empty() => Ok(Self {
                api_version: environment.api_version,
                operator_in_cluster: environment.operator_in_cluster,
                log_group: log_group.unwrap_or_else(|| cluster_name.clone()),
                region,
                bucket,
                cluster_name,
                instance_type,
                telemetry,
                min_instances,
                max_instances,
                instance_volume_size,
                instance_metadata,
            }),
            _ => Err(ConfigError::Invalid(violations)),
        }
    }

    /// API/schema version the configuration was loaded under.
    #[must_use]
    pub const fn api_version(&self) -> &str {
        self.api_version.as_str()
    }

    /// Whether the orchestration client runs inside the cluster.
    #[must_use]
    pub const fn operator_in_cluster(&self) -> bool {
        self.operator_in_cluster
    }

    /// Cloud region hosting the cluster.
    #[must_use]
    pub const fn region(&self) -> &str {
        self.region.as_str()
    }

    /// Storage bucket used by the cluster.
    #[must_use]
    pub const fn bucket(&self) -> &str {
        self.bucket.as_str()
    }

    /// Logical cluster name.
    #[must_use]
    pub const fn cluster_name(&self) -> &str {
        self.cluster_name.as_str()
    }

    /// Worker instance type.
    #[must_use]
    pub const fn instance_type(&self) -> &str {
        self.instance_type.as_str()
    }

    /// Whether the operator may send telemetry.
    #[must_use]
    pub const fn telemetry(&self) -> bool {
        self.telemetry
    }

    /// Lower autoscaling bound.
    #[must_use]
    pub const fn min_instances(&self) -> u64 {
        self.min_instances
    }

    /// Upper autoscaling bound.
    #[must_use]
    pub const fn max_instances(&self) -> u64 {
        self.max_instances
    }

    /// Worker root volume size in GiB.
    #[must_use]
    pub const fn instance_volume_size(&self) -> u64 {
        self.instance_volume_size
    }

    /// Log group receiving cluster logs.
    #[must_use]
    pub const fn log_group(&self) -> &str {
        self.log_group.as_str()
    }

    /// Metadata for the configured instance type in the configured region.
    #[must_use]
    pub const fn instance_metadata(&self) -> &InstanceMetadata {
        &self.instance_metadata
    }
}

fn parse_document(bytes: &[u8]) -> Result<Map<String, Value>, String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|error| format!("configuration is not valid UTF-8: {error}"))?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_saphyr::from_str(text)
        .map_err(|error| format!("configuration is not valid YAML: {error}"))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(String::from("top level of the configuration must be a mapping")),
    }
}

fn check_region(region: &str) -> Result<(), String> {
    if catalog::is_supported_region(region) {
        Ok(())
    } else {
        Err(format!("'{region}' is not a supported region"))
    }
}

/// Pulls typed fields out of the document while recording violations.
struct FieldReader {
    document: Map<String, Value>,
    violations: Violations,
}

impl FieldReader {
    fn new(document: Map<String, Value>) -> Self {
        Self {
            document,
            violations: Violations::new(),
        }
    }

    fn take(&mut self, field: &str) -> Option<Value> {
        self.document.remove(field).filter(|value| !value.is_null())
    }

    fn required_string(&mut self, field: &str) -> Option<String> {
        let value = self.optional_string(field);
        if value.is_none() && !self.violations.contains_field(field) {
            self.violations.push(field, ViolationKind::Missing);
        }
        value
    }

    fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.take(field)? {
            Value::String(text) => Some(text),
            _ => {
                self.wrong_type(field, "a string");
                None
            }
        }
    }

    fn required_bool(&mut self, field: &str) -> Option<bool> {
        match self.take(field) {
            Some(Value::Bool(flag)) => Some(flag),
            Some(_) => {
                self.wrong_type(field, "a boolean");
                None
            }
            None => {
                self.violations.push(field, ViolationKind::Missing);
                None
            }
        }
    }

    fn optional_u64(&mut self, field: &str) -> Option<u64> {
        let value = self.take(field)?;
        let number = value.as_u64();
        if number.is_none() {
            self.wrong_type(field, "a non-negative integer");
        }
        number
    }

    fn check(
        &mut self,
        field: &str,
        value: String,
        rule: impl FnOnce(&str) -> Result<(), String>,
    ) -> Option<String> {
        match rule(&value) {
            Ok(()) => Some(value),
            Err(reason) => {
                self.invalid(field, reason);
                None
            }
        }
    }

    fn invalid(&mut self, field: &str, reason: String) {
        self.violations
            .push(field, ViolationKind::Invalid { reason });
    }

    fn wrong_type(&mut self, field: &str, expected: &'static str) {
        self.violations
            .push(field, ViolationKind::WrongType { expected });
    }

    fn finish(mut self) -> Violations {
        let mut leftover: Vec<&String> = self.document.keys().collect();
        leftover.sort();
        for key in leftover {
            let kind = if ENVIRONMENT_KEYS.contains(&key.as_str()) {
                ViolationKind::EnvironmentControlled
            } else {
                ViolationKind::Unknown
            };
            self.violations.push(key.clone(), kind);
        }
        self.violations
    }
}
