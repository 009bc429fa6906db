//! User lookups against the auth service

use std::sync::Arc;

use relaybox_security::{ApiKeyParts, Error, Result};
use url::Url;

use crate::request::{HttpClient, PUBLIC_KEY_HEADER, RequestParams, endpoint};
use crate::types::AuthUser;
use crate::validation::require_params;

/// Auth service operations, obtained from [`crate::RelayBox::auth`]
#[derive(Debug, Clone)]
pub struct Auth {
    api_key: Arc<ApiKeyParts>,
    auth_service_url: Option<Url>,
    http: HttpClient,
}

impl Auth {
    pub(crate) fn new(
        api_key: Arc<ApiKeyParts>,
        auth_service_url: Option<Url>,
        http: HttpClient,
    ) -> Self {
        Self {
            api_key,
            auth_service_url,
            http,
        }
    }

    /// Configured auth service URL, if any
    #[must_use]
    pub fn auth_service_url(&self) -> Option<&Url> {
        self.auth_service_url.as_ref()
    }

    /// Fetch a user by client id.
    ///
    /// The client id is percent-encoded into the path.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if `client_id` or `auth_token` is empty, or no
    ///   auth service URL is configured
    /// - `HTTPServiceError` if the service rejects the request
    /// - `NetworkError` / `TimeoutError` for transport failures
    pub async fn get_user(&self, client_id: &str, auth_token: &str) -> Result<AuthUser> {
        require_params([
            ("clientId", !client_id.is_empty()),
            ("authToken", !auth_token.is_empty()),
        ])?;
        let base = self
            .auth_service_url
            .as_ref()
            .ok_or_else(|| Error::validation("Missing required arguments: authServiceUrl"))?;

        let params = RequestParams::get()
            .header(PUBLIC_KEY_HEADER, self.api_key.public_key())
            .bearer(auth_token);

        self.http
            .service_request(endpoint(base, &["users", client_id])?, params)
            .await
    }
}
