//! Cloud-provider client construction.
//!
//! The operator cannot do anything useful without cloud access, so a failure
//! reported by a [`CloudClientFactory`] is classified as fatal by the
//! bootstrap. Factories themselves never terminate the process; they only
//! return a [`CloudClientError`].

mod aws;

use cortex_config::ClusterConfiguration;
use thiserror::Error;

pub use aws::{
    ACCESS_KEY_ID_ENV_VAR, AwsClient, AwsClientFactory, AwsCredentials, SECRET_ACCESS_KEY_ENV_VAR,
    SESSION_TOKEN_ENV_VAR, account_id_from_access_key,
};

/// Inputs required to build a cloud client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSettings {
    /// Region the client is bound to.
    pub region: String,
    /// Bucket holding cluster state.
    pub bucket: String,
    /// Whether the client must resolve the account it runs under.
    pub with_account_id: bool,
}

impl CloudSettings {
    /// Derives settings from the validated configuration.
    ///
    /// The operator always resolves the account so it can derive the cluster
    /// identity.
    #[must_use]
    pub fn from_config(config: &ClusterConfiguration) -> Self {
        Self {
            region: config.region().to_owned(),
            bucket: config.bucket().to_owned(),
            with_account_id: true,
        }
    }
}

/// Capabilities the rest of the operator needs from a cloud client.
pub trait CloudClient {
    /// Region the client is bound to.
    fn region(&self) -> &str;

    /// Bucket holding cluster state.
    fn bucket(&self) -> &str;

    /// Hashed identifier of the cloud account, when it was resolved.
    fn hashed_account_id(&self) -> Option<&str>;
}

/// Builds cloud clients.
pub trait CloudClientFactory {
    /// Client type produced by the factory.
    type Client: CloudClient;

    /// Constructs a client for the supplied settings.
    fn create(&self, settings: &CloudSettings) -> Result<Self::Client, CloudClientError>;
}

/// Errors reported while constructing a cloud client.
#[derive(Debug, Error)]
pub enum CloudClientError {
    /// A required credential variable was unset or empty.
    #[error("missing cloud credentials: {variable} is not set")]
    MissingCredentials {
        /// Name of the missing variable.
        variable: &'static str,
    },
    /// The region is not served by the client.
    #[error("unsupported region '{region}'")]
    UnsupportedRegion {
        /// Rejected region.
        region: String,
    },
    /// No bucket was supplied.
    #[error("a storage bucket is required")]
    MissingBucket,
    /// The account could not be derived from the access key.
    #[error("cannot resolve account from access key: {reason}")]
    InvalidAccessKey {
        /// Why the key was rejected.
        reason: String,
    },
    /// Any other construction failure.
    #[error("cloud client unavailable: {message}")]
    Unavailable {
        /// Human-readable description.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CloudClientError {
    /// Builds an [`CloudClientError::Unavailable`] without an underlying source.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }
}
