//! Deterministic cluster identity.

use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

use cortex_config::ClusterConfiguration;

/// Stable identifier of a logical cluster.
///
/// Derived as the SHA-256 of the cluster name, region and account fingerprint
/// concatenated in that order, so restarts of the same cluster in the same
/// account always agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterIdentity(String);

impl ClusterIdentity {
    /// Derives the identity from its raw inputs.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingAccountFingerprint`] when no
    /// fingerprint is available.
    pub fn derive(
        cluster_name: &str,
        region: &str,
        account_fingerprint: Option<&str>,
    ) -> Result<Self, IdentityError> {
        let fingerprint = account_fingerprint
            .filter(|fingerprint| !fingerprint.is_empty())
            .ok_or(IdentityError::MissingAccountFingerprint)?;
        let mut hasher = Sha256::new();
        hasher.update(cluster_name.as_bytes());
        hasher.update(region.as_bytes());
        hasher.update(fingerprint.as_bytes());
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Derives the identity for a loaded configuration.
    ///
    /// # Errors
    ///
    /// See [`ClusterIdentity::derive`].
    pub fn for_cluster(
        config: &ClusterConfiguration,
        account_fingerprint: Option<&str>,
    ) -> Result<Self, IdentityError> {
        Self::derive(config.cluster_name(), config.region(), account_fingerprint)
    }

    /// Hex-encoded identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Errors raised while deriving the identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The cloud client did not expose an account fingerprint.
    #[error("cloud client did not provide an account fingerprint")]
    MissingAccountFingerprint,
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
