//! Client configuration
//!
//! [`RelayBoxOptions`] is deserializable (camelCase field names, matching the
//! JSON configuration the platform documents) and can also be assembled with
//! builder methods or read from `RELAYBOX_*` environment variables.

use std::fmt;
use std::time::Duration;

use relaybox_security::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::validation::require_params;

/// Default core service (event publishing)
pub const DEFAULT_CORE_SERVICE_URL: &str = "https://gnet.prod.relaybox-services.net";

/// Default deadline for a single HTTP round trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "RELAYBOX_API_KEY";
/// Environment variable overriding the core service URL
pub const ENV_CORE_SERVICE_URL: &str = "RELAYBOX_CORE_SERVICE_URL";
/// Environment variable setting the state service URL
pub const ENV_STATE_SERVICE_URL: &str = "RELAYBOX_STATE_SERVICE_URL";
/// Environment variable setting the auth service URL
pub const ENV_AUTH_SERVICE_URL: &str = "RELAYBOX_AUTH_SERVICE_URL";
/// Environment variable overriding the request timeout, in milliseconds
pub const ENV_REQUEST_TIMEOUT_MS: &str = "RELAYBOX_REQUEST_TIMEOUT_MS";

/// Options for constructing a [`crate::RelayBox`] client
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayBoxOptions {
    /// API key in the form `appPid.keyId:secretKey`
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub api_key: SecretString,
    /// Core service base URL; defaults to [`DEFAULT_CORE_SERVICE_URL`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_service_url: Option<String>,
    /// State service base URL, required for room creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_service_url: Option<String>,
    /// Auth service base URL, required for user lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_service_url: Option<String>,
    /// Per-request deadline in milliseconds; defaults to 10 000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

fn serialize_secret<S>(secret: &SecretString, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

impl RelayBoxOptions {
    /// Create options with the given API key and every other setting defaulted
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            core_service_url: None,
            state_service_url: None,
            auth_service_url: None,
            request_timeout_ms: None,
        }
    }

    /// Override the core service URL
    #[must_use]
    pub fn with_core_service_url(mut self, url: impl Into<String>) -> Self {
        self.core_service_url = Some(url.into());
        self
    }

    /// Set the state service URL
    #[must_use]
    pub fn with_state_service_url(mut self, url: impl Into<String>) -> Self {
        self.state_service_url = Some(url.into());
        self
    }

    /// Set the auth service URL
    #[must_use]
    pub fn with_auth_service_url(mut self, url: impl Into<String>) -> Self {
        self.auth_service_url = Some(url.into());
        self
    }

    /// Override the request deadline
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Load options from `RELAYBOX_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `RELAYBOX_API_KEY` is unset or empty,
    /// or if `RELAYBOX_REQUEST_TIMEOUT_MS` is not a number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load options through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`RelayBoxOptions::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let api_key = var(ENV_API_KEY);
        require_params([("apiKey", api_key.is_some())])?;

        let request_timeout_ms = var(ENV_REQUEST_TIMEOUT_MS)
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| {
                    Error::validation(format!("Invalid {ENV_REQUEST_TIMEOUT_MS} '{raw}', {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            api_key: SecretString::new(api_key.unwrap_or_default()),
            core_service_url: var(ENV_CORE_SERVICE_URL),
            state_service_url: var(ENV_STATE_SERVICE_URL),
            auth_service_url: var(ENV_AUTH_SERVICE_URL),
            request_timeout_ms,
        })
    }

    /// The configured API key
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Effective request deadline
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_ms
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_millis)
    }

    /// Effective core service URL, validated.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the configured URL is not an absolute
    /// `http` or `https` URL.
    pub fn core_service_url(&self) -> Result<Url> {
        parse_service_url(
            "coreServiceUrl",
            self.core_service_url
                .as_deref()
                .unwrap_or(DEFAULT_CORE_SERVICE_URL),
        )
    }

    /// State service URL, validated, if configured.
    ///
    /// # Errors
    ///
    /// See [`RelayBoxOptions::core_service_url`].
    pub fn state_service_url(&self) -> Result<Option<Url>> {
        self.state_service_url
            .as_deref()
            .map(|url| parse_service_url("stateServiceUrl", url))
            .transpose()
    }

    /// Auth service URL, validated, if configured.
    ///
    /// # Errors
    ///
    /// See [`RelayBoxOptions::core_service_url`].
    pub fn auth_service_url(&self) -> Result<Option<Url>> {
        self.auth_service_url
            .as_deref()
            .map(|url| parse_service_url("authServiceUrl", url))
            .transpose()
    }
}

impl fmt::Debug for RelayBoxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayBoxOptions")
            .field("api_key", &"[REDACTED]")
            .field("core_service_url", &self.core_service_url)
            .field("state_service_url", &self.state_service_url)
            .field("auth_service_url", &self.auth_service_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

fn parse_service_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::validation(format!("Invalid {name} '{raw}', {e}")))?;

    if matches!(url.scheme(), "http" | "https") && url.has_host() {
        Ok(url)
    } else {
        Err(Error::validation(format!(
            "Invalid {name} '{raw}', expected an http or https URL"
        )))
    }
}
