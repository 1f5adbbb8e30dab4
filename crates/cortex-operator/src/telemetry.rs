//! Best-effort product telemetry keyed by the cluster identity.
//!
//! Telemetry never blocks startup. [`initialise`] reports failures to the
//! caller, which logs them and carries on with [`TelemetryChannel::disabled`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use strum::{Display, EnumString};
use thiserror::Error;

use crate::identity::ClusterIdentity;

const TELEMETRY_TARGET: &str = "cortex_operator::telemetry";

/// Environment tag attached to every record sent by the operator.
pub const TELEMETRY_ENVIRONMENT: &str = "operator";

/// Property carrying the derived cluster identity.
pub const CLUSTER_ID_PROPERTY: &str = "clusterID";

/// Window during which repeated errors are suppressed.
pub const BACKOFF_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Policy controlling how often error records are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BackoffMode {
    /// Every error is sent.
    None,
    /// An identical message is sent at most once per cooldown.
    DuplicateMessages,
    /// At most one error of any kind is sent per cooldown.
    #[default]
    AnyMessages,
}

/// Settings used to start the telemetry channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Whether telemetry is enabled at all.
    pub enabled: bool,
    /// Anonymous user identifier.
    pub user_id: String,
    /// Properties attached to every record.
    pub properties: BTreeMap<String, String>,
    /// Environment tag.
    pub environment: String,
    /// Whether errors are also written to the operator log.
    pub log_errors: bool,
    /// Error suppression policy.
    pub backoff: BackoffMode,
}

impl TelemetryConfig {
    /// Builds the operator's telemetry settings for a derived identity.
    ///
    /// The account fingerprint doubles as the user id.
    #[must_use]
    pub fn for_cluster(
        enabled: bool,
        account_fingerprint: impl Into<String>,
        identity: &ClusterIdentity,
    ) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(CLUSTER_ID_PROPERTY.to_owned(), identity.as_str().to_owned());
        Self {
            enabled,
            user_id: account_fingerprint.into(),
            properties,
            environment: TELEMETRY_ENVIRONMENT.to_owned(),
            log_errors: true,
            backoff: BackoffMode::AnyMessages,
        }
    }
}

/// Payload of a telemetry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// Named product event.
    Event(String),
    /// Error message.
    Error(String),
}

/// A single record handed to a [`TelemetrySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRecord {
    /// Anonymous user identifier.
    pub user_id: String,
    /// Environment tag.
    pub environment: String,
    /// Event or error payload.
    pub kind: RecordKind,
    /// Channel properties merged with per-record properties.
    pub properties: BTreeMap<String, String>,
}

/// Destination for telemetry records.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink: Send + Sync {
    /// Prepares the sink for the given settings.
    fn open(&self, config: &TelemetryConfig) -> Result<(), TelemetryError>;

    /// Delivers a record. Delivery is fire-and-forget.
    fn send(&self, record: &TelemetryRecord);
}

/// Sink that emits records as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn open(&self, config: &TelemetryConfig) -> Result<(), TelemetryError> {
        tracing::debug!(
            target: TELEMETRY_TARGET,
            environment = %config.environment,
            backoff = %config.backoff,
            "telemetry sink opened"
        );
        Ok(())
    }

    fn send(&self, record: &TelemetryRecord) {
        let properties = format!("{:?}", record.properties);
        match &record.kind {
            RecordKind::Event(name) => tracing::info!(
                target: TELEMETRY_TARGET,
                event = %name,
                user_id = %record.user_id,
                environment = %record.environment,
                properties = %properties,
                "telemetry event"
            ),
            RecordKind::Error(message) => tracing::info!(
                target: TELEMETRY_TARGET,
                error = %message,
                user_id = %record.user_id,
                environment = %record.environment,
                properties = %properties,
                "telemetry error"
            ),
        }
    }
}

/// Errors raised while starting telemetry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// Telemetry was enabled without a user id.
    #[error("telemetry requires a user id")]
    MissingUserId,
    /// The sink refused to open.
    #[error("telemetry sink unavailable: {message}")]
    SinkUnavailable {
        /// Reason reported by the sink.
        message: String,
    },
}

#[derive(Debug)]
struct Backoff {
    mode: BackoffMode,
    cooldown: Duration,
    last_sent: Option<Instant>,
    sent_messages: HashMap<String, Instant>,
}

impl Backoff {
    fn new(mode: BackoffMode, cooldown: Duration) -> Self {
        Self {
            mode,
            cooldown,
            last_sent: None,
            sent_messages: HashMap::new(),
        }
    }

    fn should_send(&mut self, message: &str, now: Instant) -> bool {
        match self.mode {
            BackoffMode::None => true,
            BackoffMode::AnyMessages => {
                if self.cooling(self.last_sent, now) {
                    return false;
                }
                self.last_sent = Some(now);
                true
            }
            BackoffMode::DuplicateMessages => {
                let previous = self.sent_messages.get(message).copied();
                if self.cooling(previous, now) {
                    return false;
                }
                let cooldown = self.cooldown;
                self.sent_messages
                    .retain(|_, sent| now.saturating_duration_since(*sent) < cooldown);
                self.sent_messages.insert(message.to_owned(), now);
                true
            }
        }
    }

    fn cooling(&self, previous: Option<Instant>, now: Instant) -> bool {
        previous.is_some_and(|sent| now.saturating_duration_since(sent) < self.cooldown)
    }
}

struct ActiveChannel {
    config: TelemetryConfig,
    sink: Arc<dyn TelemetrySink>,
    backoff: Mutex<Backoff>,
}

/// Handle used to record telemetry for the lifetime of the process.
pub struct TelemetryChannel {
    active: Option<ActiveChannel>,
}

impl TelemetryChannel {
    /// Channel that drops every record.
    #[must_use]
    pub fn disabled() -> Self {
        Self { active: None }
    }

    /// Whether records are delivered.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    /// Records a named event with additional properties.
    pub fn record_event(&self, name: &str, properties: BTreeMap<String, String>) {
        let Some(active) = &self.active else {
            return;
        };
        active.deliver(RecordKind::Event(name.to_owned()), properties);
    }

    /// Records an error, subject to the backoff policy.
    ///
    /// Returns whether the error was delivered to the sink.
    pub fn record_error(&self, error: &dyn std::error::Error) -> bool {
        self.record_error_at(&error.to_string(), Instant::now())
    }

    fn record_error_at(&self, message: &str, now: Instant) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        if active.config.log_errors {
            tracing::error!(target: TELEMETRY_TARGET, error = %message, "operator error");
        }
        let allowed = active
            .backoff
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .should_send(message, now);
        if allowed {
            active.deliver(RecordKind::Error(message.to_owned()), BTreeMap::new());
        }
        allowed
    }
}

impl ActiveChannel {
    fn deliver(&self, kind: RecordKind, extra: BTreeMap<String, String>) {
        let mut properties = self.config.properties.clone();
        properties.extend(extra);
        self.sink.send(&TelemetryRecord {
            user_id: self.config.user_id.clone(),
            environment: self.config.environment.clone(),
            kind,
            properties,
        });
    }
}

impl fmt::Debug for TelemetryChannel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TelemetryChannel")
            .field("enabled", &self.is_enabled())
            .field(
                "backoff",
                &self.active.as_ref().map(|active| active.config.backoff),
            )
            .finish()
    }
}

/// Starts the telemetry channel.
///
/// A disabled configuration yields [`TelemetryChannel::disabled`] without
/// touching the sink.
///
/// # Errors
///
/// Returns [`TelemetryError::MissingUserId`] when enabled without a user id,
/// or the sink's error when it fails to open.
pub fn initialise(
    config: TelemetryConfig,
    sink: Arc<dyn TelemetrySink>,
) -> Result<TelemetryChannel, TelemetryError> {
    if !config.enabled {
        return Ok(TelemetryChannel::disabled());
    }
    if config.user_id.is_empty() {
        return Err(TelemetryError::MissingUserId);
    }
    sink.open(&config)?;
    let backoff = Mutex::new(Backoff::new(config.backoff, BACKOFF_COOLDOWN));
    Ok(TelemetryChannel {
        active: Some(ActiveChannel {
            config,
            sink,
            backoff,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;
    use rstest::{fixture, rstest};

    #[fixture]
    fn identity() -> ClusterIdentity {
        ClusterIdentity::derive("cortex", "us-west-2", Some("fingerprint")).expect("identity")
    }

    fn config(identity: &ClusterIdentity, backoff: BackoffMode) -> TelemetryConfig {
        let mut config = TelemetryConfig::for_cluster(true, "fingerprint", identity);
        config.backoff = backoff;
        config
    }

    fn open_sink(sends: usize) -> MockTelemetrySink {
        let mut sink = MockTelemetrySink::new();
        sink.expect_open().times(1).returning(|_| Ok(()));
        sink.expect_send().with(always()).times(sends).return_const(());
        sink
    }

    #[rstest]
    fn operator_settings_tag_records(identity: ClusterIdentity) {
        let config = TelemetryConfig::for_cluster(true, "fingerprint", &identity);
        assert_eq!(config.environment, "operator");
        assert!(config.log_errors);
        assert_eq!(config.backoff, BackoffMode::AnyMessages);
        assert_eq!(
            config.properties.get(CLUSTER_ID_PROPERTY).map(String::as_str),
            Some(identity.as_str())
        );
    }

    #[rstest]
    fn disabled_config_never_opens_sink(identity: ClusterIdentity) {
        let mut sink = MockTelemetrySink::new();
        sink.expect_open().never();
        sink.expect_send().never();
        let mut settings = config(&identity, BackoffMode::None);
        settings.enabled = false;

        let channel = initialise(settings, Arc::new(sink)).expect("disabled channel");
        assert!(!channel.is_enabled());
        channel.record_event("ignored", BTreeMap::new());
        assert!(!channel.record_error(&TelemetryError::MissingUserId));
    }

    #[rstest]
    fn empty_user_id_is_rejected(identity: ClusterIdentity) {
        let mut settings = config(&identity, BackoffMode::None);
        settings.user_id.clear();
        let result = initialise(settings, Arc::new(MockTelemetrySink::new()));
        assert_eq!(result.err(), Some(TelemetryError::MissingUserId));
    }

    #[rstest]
    fn sink_failures_are_returned(identity: ClusterIdentity) {
        let mut sink = MockTelemetrySink::new();
        sink.expect_open().returning(|_| {
            Err(TelemetryError::SinkUnavailable {
                message: String::from("offline"),
            })
        });
        let result = initialise(config(&identity, BackoffMode::None), Arc::new(sink));
        assert!(matches!(
            result,
            Err(TelemetryError::SinkUnavailable { message }) if message == "offline"
        ));
    }

    #[rstest]
    fn events_carry_channel_properties(identity: ClusterIdentity) {
        let expected_id = identity.as_str().to_owned();
        let mut sink = MockTelemetrySink::new();
        sink.expect_open().returning(|_| Ok(()));
        sink.expect_send()
            .withf(move |record| {
                record.kind == RecordKind::Event(String::from("operator.ready"))
                    && record.environment == "operator"
                    && record.properties.get(CLUSTER_ID_PROPERTY) == Some(&expected_id)
                    && record.properties.get("phase").map(String::as_str) == Some("startup")
            })
            .times(1)
            .return_const(());
        let channel = initialise(config(&identity, BackoffMode::None), Arc::new(sink))
            .expect("channel should open");

        let mut extra = BTreeMap::new();
        extra.insert(String::from("phase"), String::from("startup"));
        channel.record_event("operator.ready", extra);
    }

    #[rstest]
    #[case(BackoffMode::None, 3)]
    #[case(BackoffMode::DuplicateMessages, 2)]
    #[case(BackoffMode::AnyMessages, 1)]
    fn backoff_limits_errors_within_cooldown(
        identity: ClusterIdentity,
        #[case] mode: BackoffMode,
        #[case] expected: usize,
    ) {
        let channel = initialise(config(&identity, mode), Arc::new(open_sink(expected)))
            .expect("channel should open");
        let now = Instant::now();
        let sent = [
            channel.record_error_at("boom", now),
            channel.record_error_at("boom", now + Duration::from_secs(1)),
            channel.record_error_at("other", now + Duration::from_secs(2)),
        ];
        assert_eq!(sent.iter().filter(|delivered| **delivered).count(), expected);
    }

    #[rstest]
    fn cooldown_expiry_allows_resend(identity: ClusterIdentity) {
        let channel = initialise(
            config(&identity, BackoffMode::AnyMessages),
            Arc::new(open_sink(2)),
        )
        .expect("channel should open");
        let now = Instant::now();
        assert!(channel.record_error_at("boom", now));
        assert!(!channel.record_error_at("boom", now + Duration::from_secs(299)));
        assert!(channel.record_error_at("boom", now + BACKOFF_COOLDOWN));
    }

    #[test]
    fn duplicate_tracking_forgets_messages_after_cooldown() {
        let mut backoff = Backoff::new(BackoffMode::DuplicateMessages, BACKOFF_COOLDOWN);
        let now = Instant::now();
        for index in 0..50 {
            assert!(backoff.should_send(&format!("error {index}"), now));
        }
        assert_eq!(backoff.sent_messages.len(), 50);

        let later = now + BACKOFF_COOLDOWN;
        assert!(backoff.should_send("error 0", later));
        assert_eq!(backoff.sent_messages.len(), 1);
        assert!(!backoff.should_send("error 0", later + Duration::from_secs(1)));
    }

    #[rstest]
    #[case("none", BackoffMode::None)]
    #[case("duplicate_messages", BackoffMode::DuplicateMessages)]
    #[case("ANY_MESSAGES", BackoffMode::AnyMessages)]
    fn parses_backoff_modes(#[case] raw: &str, #[case] expected: BackoffMode) {
        assert_eq!(raw.parse::<BackoffMode>().expect("known mode"), expected);
    }
}
