//! HTTP request layer
//!
//! A thin wrapper over `reqwest` that maps every outcome into the shared error
//! taxonomy:
//!
//! | Outcome                         | Error kind         | status          |
//! |---------------------------------|--------------------|-----------------|
//! | deadline exceeded               | `TimeoutError`     | 0               |
//! | host unreachable                | `NetworkError`     | 0               |
//! | non-2xx from [`HttpClient::request`]         | `HTTPRequestError` | response status |
//! | non-2xx from [`HttpClient::service_request`] | `HTTPServiceError` | response status |
//! | body is not the expected JSON   | `HTTPRequestError` | response status |
//!
//! Redirects are never followed and nothing is retried.

use std::time::Duration;

use relaybox_security::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Message used for every connection-level failure
pub const NETWORK_ERROR_MESSAGE: &str = "Network request failed: Unable to connect to the server";

/// Message used when the request deadline passes
pub const TIMEOUT_ERROR_MESSAGE: &str = "The operation was aborted due to timeout";

const SERVICE_ERROR_MESSAGE: &str = "Service request failed";

/// Header carrying the public half of the API key
pub const PUBLIC_KEY_HEADER: &str = "X-Ds-Public-Key";

/// Header carrying the HMAC signature of the request body
pub const SIGNATURE_HEADER: &str = "X-Ds-Req-Signature";

/// A successful response with its JSON body decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Decoded body
    pub data: T,
    /// The body's top-level `message` field, if it had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Method, headers and body of an outgoing request
#[derive(Debug, Clone)]
pub struct RequestParams {
    method: Method,
    headers: Vec<(&'static str, String)>,
    body: Option<String>,
}

impl RequestParams {
    /// A `GET` request
    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// A `POST` request carrying a pre-serialized JSON body
    #[must_use]
    pub fn post(body: impl Into<String>) -> Self {
        let mut params = Self::new(Method::POST);
        params.body = Some(body.into());
        params
    }

    fn new(method: Method) -> Self {
        Self {
            method,
            headers: vec![("Content-Type", "application/json".to_string())],
            body: None,
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Add an `Authorization: Bearer` header
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// The request method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request body, if any
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Shared HTTP client with a fixed per-request deadline
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client that gives up on any round trip after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| Error::validation(format!("Failed to build HTTP client, {e}")))?;

        Ok(Self { inner, timeout })
    }

    /// The per-request deadline
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and decode a successful JSON response.
    ///
    /// # Errors
    ///
    /// - `HTTPRequestError` with message `"<status> <reason>"` for non-2xx
    ///   responses, or when the body does not decode as `T`
    /// - `NetworkError` / `TimeoutError` for transport failures
    pub async fn request<T: DeserializeOwned>(
        &self,
        url: Url,
        params: RequestParams,
    ) -> Result<FormattedResponse<T>> {
        let (status, bytes) = self.send(url, params).await?;

        if !status.is_success() {
            return Err(Error::http_request(status_line(status), status.as_u16()));
        }

        let body = decode_json(status, &bytes)?;
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string);
        let data = serde_json::from_value(body).map_err(|e| decode_error(status, &e))?;

        Ok(FormattedResponse {
            status: status.as_u16(),
            data,
            message,
        })
    }

    /// Send a request to a service endpoint that reports failures in its body.
    ///
    /// # Errors
    ///
    /// - `HTTPServiceError` for non-2xx responses, with the body's `message`
    ///   (or `"Service request failed"`) and the whole body in `details`
    /// - `HTTPRequestError` when a 2xx body does not decode as `T`
    /// - `NetworkError` / `TimeoutError` for transport failures
    pub async fn service_request<T: DeserializeOwned>(
        &self,
        url: Url,
        params: RequestParams,
    ) -> Result<T> {
        let (status, bytes) = self.send(url, params).await?;

        if !status.is_success() {
            let body = serde_json::from_slice::<Value>(&bytes).ok();
            let message = body
                .as_ref()
                .and_then(|body| body.get("message"))
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or(SERVICE_ERROR_MESSAGE)
                .to_string();

            return Err(Error::http_service(status.as_u16(), message, body));
        }

        let body = decode_json(status, &bytes)?;
        serde_json::from_value(body).map_err(|e| decode_error(status, &e))
    }

    async fn send(&self, url: Url, params: RequestParams) -> Result<(StatusCode, Vec<u8>)> {
        let RequestParams {
            method,
            headers,
            body,
        } = params;

        debug!(method = %method, url = %url, "sending request");

        let mut builder = self.inner.request(method.clone(), url.clone());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;

        debug!(method = %method, url = %url, status = status.as_u16(), "received response");

        Ok((status, bytes.to_vec()))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("inner", &"<reqwest::Client>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Append path segments to a service base URL, percent-encoding each one.
///
/// # Errors
///
/// Returns a `ValidationError` if `base` cannot carry a path.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::validation(format!("Invalid service URL '{base}'")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

fn decode_json(status: StatusCode, bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| decode_error(status, &e))
}

fn decode_error(status: StatusCode, e: &serde_json::Error) -> Error {
    Error::http_request(
        format!("Failed to parse response body, {e}"),
        status.as_u16(),
    )
}

fn transport_error(e: &reqwest::Error) -> Error {
    if e.is_timeout() {
        warn!(error = %e, "request timed out");
        Error::timeout(TIMEOUT_ERROR_MESSAGE)
    } else if e.is_builder() {
        Error::validation(format!("Invalid request, {e}"))
    } else {
        warn!(error = %e, "request failed before a response was received");
        Error::network(NETWORK_ERROR_MESSAGE)
    }
}
