//! Unified RelayBox error handling.
//!
//! Every fallible operation in the workspace returns [`Error`], a single type
//! carrying a closed [`ErrorKind`], a human-readable message and optional
//! status/detail payloads.
//!
//! The token/signature core only ever produces [`ErrorKind::Validation`],
//! [`ErrorKind::Signature`] and [`ErrorKind::Token`]. The remaining kinds are
//! produced by the request layer in the `relaybox` crate.
//!
//! ## Example
//!
//! ```rust
//! use relaybox_security::error::{Error, ErrorKind, Result};
//!
//! fn check_room(room: &str) -> Result<()> {
//!     if room.is_empty() {
//!         return Err(Error::validation("Missing required arguments: roomId"));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_room("").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::Validation);
//! assert_eq!(err.kind.as_str(), "ValidationError");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for RelayBox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified RelayBox error type
///
/// `status` is set for transport-level kinds: `0` for network and timeout
/// failures, the HTTP status for non-2xx responses. `details` carries the
/// structured error body returned by a remote service, when there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    /// Error classification
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Status code (0 when the transport never produced a response)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Structured detail returned by a remote collaborator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error classification for programmatic handling
///
/// Replaces run-time name checks: match on the kind, or compare
/// [`ErrorKind::as_str`] when a stable string identifier is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed caller input. Never retryable.
    #[serde(rename = "ValidationError")]
    Validation,
    /// Signing or canonical serialization failed. Never retryable.
    #[serde(rename = "SignatureError")]
    Signature,
    /// Signed token issuance or verification failed, including expiry and
    /// forgery. Never retryable.
    #[serde(rename = "TokenError")]
    Token,
    /// The remote service could not be reached.
    #[serde(rename = "NetworkError")]
    Network,
    /// Non-2xx response from a plain request.
    #[serde(rename = "HTTPRequestError")]
    HttpRequest,
    /// Non-2xx response from a service endpoint, with its error body.
    #[serde(rename = "HTTPServiceError")]
    HttpService,
    /// The request exceeded its deadline.
    #[serde(rename = "TimeoutError")]
    Timeout,
}

impl Error {
    /// Create a new error with kind and message
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a signature error
    #[must_use]
    pub fn signature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Signature, message)
    }

    /// Create a token error
    #[must_use]
    pub fn token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Token, message)
    }

    /// Create a network error (status 0)
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message).with_status(0)
    }

    /// Create an HTTP request error for a non-2xx response
    #[must_use]
    pub fn http_request(message: impl Into<String>, status: u16) -> Self {
        Self::new(ErrorKind::HttpRequest, message).with_status(status)
    }

    /// Create an HTTP service error carrying the service's error body
    #[must_use]
    pub fn http_service(
        status: u16,
        message: impl Into<String>,
        body: Option<serde_json::Value>,
    ) -> Self {
        let mut err = Self::new(ErrorKind::HttpService, message).with_status(status);
        err.details = body;
        err
    }

    /// Create a timeout error (status 0)
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message).with_status(0)
    }

    /// Set the status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Check if the caller may retry the failed operation
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::Timeout)
    }
}

impl ErrorKind {
    /// Stable identifier for this kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::Signature => "SignatureError",
            Self::Token => "TokenError",
            Self::Network => "NetworkError",
            Self::HttpRequest => "HTTPRequestError",
            Self::HttpService => "HTTPServiceError",
            Self::Timeout => "TimeoutError",
        }
    }

    /// Get a human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Validation => "Invalid input",
            Self::Signature => "Signature generation failed",
            Self::Token => "Token issuance or verification failed",
            Self::Network => "Network unavailable",
            Self::HttpRequest => "Request rejected",
            Self::HttpService => "Service request rejected",
            Self::Timeout => "Request timed out",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
