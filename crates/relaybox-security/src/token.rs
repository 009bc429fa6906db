//! Signed token issuance and verification
//!
//! Tokens are compact HS256 JWTs signed with the secret half of an API key.
//! The claim set is the caller's [`TokenPayload`] plus three registered
//! claims added here:
//!
//! - `iss` - always [`TOKEN_ISSUER`]
//! - `iat` - issuance time (Unix seconds)
//! - `exp` - `iat + expires_in`
//!
//! Verification needs nothing but the shared secret. A token is valid until
//! `exp` and expired afterwards; there is no revocation. Expired, forged,
//! malformed and wrong-algorithm tokens all fail with the same
//! `TokenError` kind; the underlying reason is kept in the message.
//!
//! ```rust
//! use relaybox_security::token::{issue, verify, TokenPayload};
//!
//! let payload = TokenPayload::new("appPid.keyId", "2024-01-01T00:00:00.000Z");
//! let token = issue(&payload, "12345", 300).unwrap();
//!
//! let claims = verify(&token, "12345").unwrap();
//! assert_eq!(claims.payload, payload);
//! assert!(verify(&token, "abcde").is_err());
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::permissions::Permissions;

/// Issuer claim carried by every token
pub const TOKEN_ISSUER: &str = "https://relaybox.net";

/// The only accepted signing algorithm
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Sentinel client id that is treated as absent
const NULL_CLIENT_ID: &str = "null";

/// Kind of bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Client identity token returned by the facade
    #[default]
    IdToken,
    /// Room-scoped access token
    BasicAccess,
}

/// Identity of the token bearer: one client id or several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientId {
    /// A single client
    Single(String),
    /// A group of clients sharing the token
    Multiple(Vec<String>),
}

impl ClientId {
    /// Whether this is the literal `"null"` string some callers send for "no client"
    #[must_use]
    pub fn is_null_sentinel(&self) -> bool {
        matches!(self, Self::Single(id) if id == NULL_CLIENT_ID)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::Single(id.to_string())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self::Single(id)
    }
}

impl From<Vec<String>> for ClientId {
    fn from(ids: Vec<String>) -> Self {
        Self::Multiple(ids)
    }
}

/// Claims supplied by the issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    /// Public half of the issuing API key
    pub public_key: String,
    /// ISO-8601 issuance time
    pub timestamp: String,
    /// Token kind
    #[serde(default)]
    pub token_type: TokenType,
    /// Bearer identity. `"null"` is never written to a token.
    #[serde(default, skip_serializing_if = "client_id_is_absent")]
    pub client_id: Option<ClientId>,
    /// Room the token is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    /// Requested lifetime in seconds, informational only; `exp` is authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Capabilities granted to the bearer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}

fn client_id_is_absent(client_id: &Option<ClientId>) -> bool {
    client_id.as_ref().is_none_or(ClientId::is_null_sentinel)
}

impl TokenPayload {
    /// Create a payload with the given issuer key and timestamp
    #[must_use]
    pub fn new(public_key: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            timestamp: timestamp.into(),
            token_type: TokenType::default(),
            client_id: None,
            room_id: None,
            expires_in: None,
            permissions: None,
        }
    }

    /// Create a payload stamped with the current time
    #[must_use]
    pub fn now(public_key: impl Into<String>) -> Self {
        Self::new(public_key, iso_timestamp(Utc::now()))
    }

    /// Set the token type
    #[must_use]
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Set the bearer identity. The string `"null"` clears it.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<ClientId>) -> Self {
        let client_id = client_id.into();
        self.client_id = (!client_id.is_null_sentinel()).then_some(client_id);
        self
    }

    /// Scope the token to a room
    #[must_use]
    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Record the requested lifetime
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: u64) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Attach permissions
    #[must_use]
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

/// Decoded and verified claim set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer-supplied claims
    #[serde(flatten)]
    pub payload: TokenPayload,
    /// Issuer (always [`TOKEN_ISSUER`] for tokens issued here)
    pub iss: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

impl TokenClaims {
    /// Expiry as a timestamp
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Issuance as a timestamp
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

#[derive(Serialize)]
struct OutgoingClaims<'a> {
    #[serde(flatten)]
    payload: &'a TokenPayload,
    iss: &'static str,
    iat: i64,
    exp: i64,
}

/// Issue a token valid for `expires_in` seconds from now.
///
/// # Errors
///
/// - `ValidationError` if `secret` is empty or `expires_in` is zero
/// - `TokenError` if signing fails
pub fn issue(payload: &TokenPayload, secret: &str, expires_in: u64) -> Result<String> {
    issue_at(payload, secret, expires_in, Utc::now())
}

/// Issue a token as if at `issued_at`.
///
/// # Errors
///
/// See [`issue`].
pub fn issue_at(
    payload: &TokenPayload,
    secret: &str,
    expires_in: u64,
    issued_at: DateTime<Utc>,
) -> Result<String> {
    if secret.is_empty() || expires_in == 0 {
        return Err(Error::validation(
            "Please provide valid payload, secret key and expiry timeout",
        ));
    }

    let iat = issued_at.timestamp();
    let exp = i64::try_from(expires_in)
        .ok()
        .and_then(|lifetime| iat.checked_add(lifetime))
        .ok_or_else(|| Error::token("Failed to generate token, expiry out of range"))?;

    let claims = OutgoingClaims {
        payload,
        iss: TOKEN_ISSUER,
        iat,
        exp,
    };

    let token = encode(
        &Header::new(TOKEN_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::token(format!("Failed to generate token, {e}")))?;

    trace!(
        public_key = %payload.public_key,
        token_type = ?payload.token_type,
        exp,
        "issued token"
    );

    Ok(token)
}

/// Verify a token's signature and expiry and return its claims.
///
/// Only HS256 is accepted and no clock-skew leeway is applied.
///
/// # Errors
///
/// Returns a `TokenError` for any failure: empty input, malformed token,
/// wrong algorithm, bad signature, missing or passed expiry.
pub fn verify(token: &str, secret: &str) -> Result<TokenClaims> {
    if token.is_empty() || secret.is_empty() {
        return Err(Error::token(
            "Failed to validate token, token and secret key are required",
        ));
    }

    let mut validation = Validation::new(TOKEN_ALGORITHM);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| Error::token(format!("Failed to validate token, {e}")))?;

    Ok(data.claims)
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`
#[must_use]
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
