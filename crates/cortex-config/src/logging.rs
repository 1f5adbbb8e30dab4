use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Environment variable holding the log filter expression.
pub const LOG_LEVEL_ENV_VAR: &str = "CORTEX_LOG_LEVEL";

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV_VAR: &str = "CORTEX_LOG_FORMAT";

/// Log filter used when [`LOG_LEVEL_ENV_VAR`] is unset or empty.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Program name handed to the layered loader in place of real arguments.
const LOADER_PROGRAM: &str = "cortex-operator";

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

impl TryFrom<String> for LogFormat {
    type Error = LogFormatParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Logging settings resolved before the cluster configuration is read.
///
/// Loaded through `ortho_config` under the `CORTEX` prefix, so
/// [`LOG_LEVEL_ENV_VAR`] fills `log_level` and [`LOG_FORMAT_ENV_VAR`] fills
/// `log_format`. Unset or blank values fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CORTEX")]
pub struct LogSettings {
    /// Filter directive, for example `info` or `cortex_operator=debug`.
    log_level: Option<String>,
    /// Output format.
    log_format: Option<LogFormat>,
}

impl LogSettings {
    /// Builds settings from explicit values.
    #[must_use]
    pub fn new(filter: impl Into<String>, format: LogFormat) -> Self {
        Self {
            log_level: Some(filter.into()),
            log_format: Some(format),
        }
    }

    /// Loads the settings from the process environment.
    ///
    /// Command-line arguments are not consulted; the operator
    /// takes none.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when a variable holds a value that does not
    /// deserialise, such as an unsupported format.
    pub fn from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter([OsString::from(LOADER_PROGRAM)])
    }

    /// Builds settings from raw variable values, applying defaults for unset
    /// or empty values.
    ///
    /// # Errors
    ///
    /// Returns [`LogFormatParseError`] for an unsupported format.
    pub fn from_values(
        filter: Option<&str>,
        format: Option<&str>,
    ) -> Result<Self, LogFormatParseError> {
        let log_format = format
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::parse::<LogFormat>)
            .transpose()?;
        Ok(Self {
            log_level: filter.map(str::to_owned),
            log_format,
        })
    }

    /// Filter expression passed to the subscriber.
    #[must_use]
    pub fn filter(&self) -> &str {
        self.log_level
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Output format.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.log_format.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn unset_values_use_defaults() {
        let settings = LogSettings::from_values(None, Some("")).expect("defaults");
        assert_eq!(settings, LogSettings::default());
        assert_eq!(settings.filter(), "info");
        assert_eq!(settings.format(), LogFormat::Json);
    }

    #[test]
    fn blank_filter_falls_back_to_default() {
        let settings = LogSettings::from_values(Some("  "), None).expect("blank filter");
        assert_eq!(settings.filter(), DEFAULT_LOG_FILTER);
    }

    #[rstest]
    #[case("compact", LogFormat::Compact)]
    #[case("JSON", LogFormat::Json)]
    #[case(" Compact ", LogFormat::Compact)]
    fn parses_formats_case_insensitively(#[case] raw: &str, #[case] expected: LogFormat) {
        let settings = LogSettings::from_values(Some("debug"), Some(raw)).expect("valid format");
        assert_eq!(settings.format(), expected);
        assert_eq!(settings.filter(), "debug");
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(LogSettings::from_values(None, Some("xml")).is_err());
    }

    #[rstest]
    #[case("\"Compact\"", LogFormat::Compact)]
    #[case("\"json\"", LogFormat::Json)]
    fn deserialises_formats_through_serde(#[case] raw: &str, #[case] expected: LogFormat) {
        let format: LogFormat = serde_json::from_str(raw).expect("valid format");
        assert_eq!(format, expected);
    }
}
