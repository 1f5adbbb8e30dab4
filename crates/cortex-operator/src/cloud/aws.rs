//! AWS client built from static credentials.

use std::env;
use std::fmt;

use cortex_config::is_supported_region;
use url::Url;

use super::{CloudClient, CloudClientError, CloudClientFactory, CloudSettings};
use crate::identity::sha256_hex;

/// Environment variable holding the access key id.
pub const ACCESS_KEY_ID_ENV_VAR: &str = "AWS_ACCESS_KEY_ID";

/// Environment variable holding the secret access key.
pub const SECRET_ACCESS_KEY_ENV_VAR: &str = "AWS_SECRET_ACCESS_KEY";

/// Environment variable holding an optional session token.
pub const SESSION_TOKEN_ENV_VAR: &str = "AWS_SESSION_TOKEN";

const CLOUD_TARGET: &str = "cortex_operator::cloud::aws";

const ACCESS_KEY_PREFIX_LEN: usize = 4;
const ACCESS_KEY_LEN: usize = 20;
const ACCOUNT_ID_MASK: u64 = 0x7fff_ffff_ff80;

/// Static AWS credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    /// Builds long-lived credentials.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attaches a session token for temporary credentials.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Reads credentials from the standard AWS environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CloudClientError::MissingCredentials`] naming the first unset
    /// or empty variable.
    pub fn from_env() -> Result<Self, CloudClientError> {
        let access_key_id = required_var(ACCESS_KEY_ID_ENV_VAR)?;
        let secret_access_key = required_var(SECRET_ACCESS_KEY_ENV_VAR)?;
        let credentials = Self::new(access_key_id, secret_access_key);
        Ok(match env::var(SESSION_TOKEN_ENV_VAR) {
            Ok(token) if !token.is_empty() => credentials.with_session_token(token),
            _ => credentials,
        })
    }

    /// Access key id.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        self.access_key_id.as_str()
    }

    /// Secret access key.
    #[must_use]
    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.as_str()
    }

    /// Session token for temporary credentials.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn required_var(name: &'static str) -> Result<String, CloudClientError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(CloudClientError::MissingCredentials { variable: name }),
    }
}

#[derive(Debug, Clone)]
enum CredentialSource {
    Environment,
    Static(AwsCredentials),
}

/// Factory producing [`AwsClient`] handles.
#[derive(Debug, Clone)]
pub struct AwsClientFactory {
    credentials: CredentialSource,
}

impl AwsClientFactory {
    /// Resolves credentials from the environment each time a client is built.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            credentials: CredentialSource::Environment,
        }
    }

    /// Uses fixed credentials.
    #[must_use]
    pub fn with_credentials(credentials: AwsCredentials) -> Self {
        Self {
            credentials: CredentialSource::Static(credentials),
        }
    }

    fn credentials(&self) -> Result<AwsCredentials, CloudClientError> {
        match &self.credentials {
            CredentialSource::Environment => AwsCredentials::from_env(),
            CredentialSource::Static(credentials) => Ok(credentials.clone()),
        }
    }
}

impl Default for AwsClientFactory {
    fn default() -> Self {
        Self::from_env()
    }
}

impl CloudClientFactory for AwsClientFactory {
    type Client = AwsClient;

    fn create(&self, settings: &CloudSettings) -> Result<AwsClient, CloudClientError> {
        if !is_supported_region(&settings.region) {
            return Err(CloudClientError::UnsupportedRegion {
                region: settings.region.clone(),
            });
        }
        if settings.bucket.is_empty() {
            return Err(CloudClientError::MissingBucket);
        }
        let credentials = self.credentials()?;

        let account_id = if settings.with_account_id {
            Some(account_id_from_access_key(credentials.access_key_id())?)
        } else {
            None
        };
        let hashed_account_id = account_id.as_deref().map(|id| sha256_hex(id.as_bytes()));

        tracing::debug!(
            target: CLOUD_TARGET,
            region = %settings.region,
            bucket = %settings.bucket,
            temporary_credentials = credentials.session_token().is_some(),
            account_resolved = account_id.is_some(),
            "aws client constructed"
        );

        Ok(AwsClient {
            region: settings.region.clone(),
            bucket: settings.bucket.clone(),
            credentials,
            account_id,
            hashed_account_id,
        })
    }
}

/// Handle to the cluster's AWS account, region and bucket.
#[derive(Debug, Clone)]
pub struct AwsClient {
    region: String,
    bucket: String,
    credentials: AwsCredentials,
    account_id: Option<String>,
    hashed_account_id: Option<String>,
}

impl AwsClient {
    /// Raw twelve-digit account id, when resolved.
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Credentials used to sign requests.
    #[must_use]
    pub fn credentials(&self) -> &AwsCredentials {
        &self.credentials
    }

    /// Virtual-hosted URL of the bucket.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the bucket or region cannot form a host.
    pub fn bucket_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "https://{}.s3.{}.amazonaws.com/",
            self.bucket, self.region
        ))
    }

    /// URL of an object stored in the bucket.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the key cannot be joined onto the bucket URL.
    pub fn object_url(&self, key: &str) -> Result<Url, url::ParseError> {
        self.bucket_url()?.join(key.trim_start_matches('/'))
    }
}

impl CloudClient for AwsClient {
    fn region(&self) -> &str {
        self.region.as_str()
    }

    fn bucket(&self) -> &str {
        self.bucket.as_str()
    }

    fn hashed_account_id(&self) -> Option<&str> {
        self.hashed_account_id.as_deref()
    }
}

/// Decodes the owning account id embedded in an access key id.
///
/// The sixteen characters after the four-letter prefix are base32. Bits 7
/// through 46 of the first six decoded bytes hold the account number.
///
/// # Errors
///
/// Returns [`CloudClientError::InvalidAccessKey`] when the key is not a
/// twenty-character key id with a valid base32 payload.
pub fn account_id_from_access_key(access_key_id: &str) -> Result<String, CloudClientError> {
    if access_key_id.len() != ACCESS_KEY_LEN || !access_key_id.is_ascii() {
        return Err(invalid_key(format!(
            "expected a {ACCESS_KEY_LEN}-character access key id"
        )));
    }
    let (prefix, payload) = access_key_id.split_at(ACCESS_KEY_PREFIX_LEN);
    if !prefix.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(invalid_key(format!("unexpected key prefix '{prefix}'")));
    }
    let decoded = decode_base32(payload)
        .ok_or_else(|| invalid_key(String::from("payload is not valid base32")))?;
    let leading = decoded
        .iter()
        .take(6)
        .fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte));
    let account = (leading & ACCOUNT_ID_MASK) >> 7;
    Ok(format!("{account:012}"))
}

fn invalid_key(reason: String) -> CloudClientError {
    CloudClientError::InvalidAccessKey { reason }
}

// RFC 4648 alphabet without padding.
fn decode_base32(input: &str) -> Option<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0_u32;
    for ch in input.bytes() {
        let value = match ch {
            b'A'..=b'Z' => ch - b'A',
            b'2'..=b'7' => ch - b'2' + 26,
            _ => return None,
        };
        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            output.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    Some(output)
}
