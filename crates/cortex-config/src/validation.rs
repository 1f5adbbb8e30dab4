//! Field-level validation rules and the aggregated violation list.

use std::fmt;
use std::net::Ipv4Addr;

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A required field was absent or null.
    Missing,
    /// The field held a value of the wrong YAML type.
    WrongType {
        /// Type the field must hold.
        expected: &'static str,
    },
    /// The value had the right type but broke a rule.
    Invalid {
        /// Human-readable explanation.
        reason: String,
    },
    /// The key is not part of the configuration schema.
    Unknown,
    /// The key is derived from the environment and cannot be set in the file.
    EnvironmentControlled,
    /// The document as a whole could not be interpreted.
    Malformed {
        /// Parser or structural explanation.
        reason: String,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => formatter.write_str("required field is missing"),
            Self::WrongType { expected } => write!(formatter, "must be {expected}"),
            Self::Invalid { reason } | Self::Malformed { reason } => formatter.write_str(reason),
            Self::Unknown => formatter.write_str("unknown key"),
            Self::EnvironmentControlled => {
                formatter.write_str("is set from the environment and cannot be configured")
            }
        }
    }
}

/// A rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    field: String,
    kind: ViolationKind,
}

impl Violation {
    /// Builds a violation for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Name of the offending field, or `document` for structural problems.
    #[must_use]
    pub const fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Reason the field was rejected.
    #[must_use]
    pub const fn kind(&self) -> &ViolationKind {
        &self.kind
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.field, self.kind)
    }
}

/// Every violation found in one validation pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Starts an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a violation.
    pub fn push(&mut self, field: impl Into<String>, kind: ViolationKind) {
        self.0.push(Violation::new(field, kind));
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded violations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the recorded violations.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Names of the offending fields, in discovery order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(Violation::field).collect()
    }

    /// Returns `true` when `field` was rejected.
    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|violation| violation.field == field)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        let noun = if count == 1 { "violation" } else { "violations" };
        write!(formatter, "{count} {noun}")?;
        for (index, violation) in self.0.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(formatter, "{separator}{violation}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Checks an S3 bucket name.
pub(crate) fn check_bucket_name(name: &str) -> Result<(), String> {
    if !(3..=63).contains(&name.len()) {
        return Err(String::from("must be between 3 and 63 characters long"));
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '.' || ch == '-')
    {
        return Err(String::from(
            "may only contain lowercase letters, digits, '.' and '-'",
        ));
    }
    if !starts_and_ends_alphanumeric(name) {
        return Err(String::from("must start and end with a letter or digit"));
    }
    if name.contains("..") {
        return Err(String::from("must not contain consecutive periods"));
    }
    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(String::from("must not be formatted as an IP address"));
    }
    Ok(())
}

/// Checks a cluster name, which doubles as a DNS label in generated resources.
pub(crate) fn check_cluster_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 63 {
        return Err(String::from("must be between 1 and 63 characters long"));
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
    {
        return Err(String::from(
            "may only contain lowercase letters, digits and '-'",
        ));
    }
    if !name.starts_with(|ch: char| ch.is_ascii_lowercase()) {
        return Err(String::from("must start with a lowercase letter"));
    }
    if name.ends_with('-') {
        return Err(String::from("must not end with '-'"));
    }
    Ok(())
}

/// Checks the `family.size` shape of an instance type.
pub(crate) fn check_instance_type_format(instance_type: &str) -> Result<(), String> {
    let well_formed = instance_type
        .split_once('.')
        .is_some_and(|(family, size)| {
            is_lower_alphanumeric(family)
                && family.starts_with(|ch: char| ch.is_ascii_lowercase())
                && is_lower_alphanumeric(size)
        });
    if well_formed {
        Ok(())
    } else {
        Err(format!(
            "'{instance_type}' is not a valid instance type (expected e.g. 'm5.large')"
        ))
    }
}

/// Checks a CloudWatch log group name.
pub(crate) fn check_log_group(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 512 {
        return Err(String::from("must be between 1 and 512 characters long"));
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '/' | '.' | '#'))
    {
        return Err(String::from(
            "may only contain letters, digits, '_', '-', '/', '.' and '#'",
        ));
    }
    Ok(())
}

fn starts_and_ends_alphanumeric(name: &str) -> bool {
    let alnum = |ch: char| ch.is_ascii_lowercase() || ch.is_ascii_digit();
    name.starts_with(alnum) && name.ends_with(alnum)
}

fn is_lower_alphanumeric(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
}
