//! API key parsing
//!
//! An API key has the form `appPid.keyId:secretKey`. The part before the
//! colon is public and identifies the issuing key; the part after it signs
//! tokens and requests and never leaves the process.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const API_KEY_FORMAT_ERROR: &str = r#"API key must be in the format "appId.keyId:secretKey""#;

/// A parsed API key
#[derive(Clone)]
pub struct ApiKeyParts {
    public_key: String,
    secret_key: SecretString,
}

impl ApiKeyParts {
    /// Split an API key into its public and secret halves.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` unless the key contains exactly one `:`
    /// with non-empty text on both sides.
    pub fn parse(api_key: &str) -> Result<Self> {
        let mut parts = api_key.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(public_key), Some(secret_key), None)
                if !public_key.is_empty() && !secret_key.is_empty() =>
            {
                Ok(Self {
                    public_key: public_key.to_string(),
                    secret_key: SecretString::new(secret_key.to_string()),
                })
            }
            _ => Err(Error::validation(API_KEY_FORMAT_ERROR)),
        }
    }

    /// Public half, sent as `X-Ds-Public-Key` and embedded in tokens
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Secret half used for signing
    #[must_use]
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl FromStr for ApiKeyParts {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for ApiKeyParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyParts")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
