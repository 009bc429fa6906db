//! Room access tokens and room creation

use std::sync::Arc;

use relaybox_security::{ApiKeyParts, Error, Result, TokenPayload, TokenType, token};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::request::{HttpClient, RequestParams, endpoint};
use crate::types::{Room, RoomMemberType, RoomOptions, RoomVisibility};
use crate::validation::require_params;

/// Room operations, obtained from [`crate::RelayBox::rooms`]
#[derive(Debug, Clone)]
pub struct Rooms {
    api_key: Arc<ApiKeyParts>,
    state_service_url: Option<Url>,
    http: HttpClient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomBody<'a> {
    room_id: &'a str,
    room_name: Option<&'a str>,
    member_type: RoomMemberType,
    visibility: RoomVisibility,
    password: Option<&'a str>,
}

impl Rooms {
    pub(crate) fn new(
        api_key: Arc<ApiKeyParts>,
        state_service_url: Option<Url>,
        http: HttpClient,
    ) -> Self {
        Self {
            api_key,
            state_service_url,
            http,
        }
    }

    /// Configured state service URL, if any
    #[must_use]
    pub fn state_service_url(&self) -> Option<&Url> {
        self.state_service_url.as_ref()
    }

    /// Issue a `basic_access` token scoping `client_id` to `room_id`.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if `room_id` or `client_id` is empty, or
    ///   `expires_in` is zero
    /// - `TokenError` if signing fails
    pub fn generate_access_token(
        &self,
        room_id: &str,
        client_id: &str,
        expires_in: u64,
    ) -> Result<String> {
        require_params([("roomId", !room_id.is_empty()), ("clientId", !client_id.is_empty())])?;

        let payload = TokenPayload::now(self.api_key.public_key())
            .with_token_type(TokenType::BasicAccess)
            .with_room_id(room_id)
            .with_client_id(client_id)
            .with_expires_in(expires_in);

        token::issue(&payload, self.api_key.secret_key(), expires_in)
    }

    /// Create a room on the state service.
    ///
    /// Unset options default to public visibility and the `member` role.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if `room_id` or `auth_token` is empty, or no state
    ///   service URL is configured
    /// - `HTTPServiceError` if the service rejects the request
    /// - `NetworkError` / `TimeoutError` for transport failures
    pub async fn create(&self, room_id: &str, auth_token: &str, options: RoomOptions) -> Result<Room> {
        require_params([("roomId", !room_id.is_empty()), ("authToken", !auth_token.is_empty())])?;
        let base = self
            .state_service_url
            .as_ref()
            .ok_or_else(|| Error::validation("Missing required arguments: stateServiceUrl"))?;

        let body = CreateRoomBody {
            room_id,
            room_name: options.room_name.as_deref(),
            member_type: options.member_type.unwrap_or_default(),
            visibility: options.visibility.unwrap_or_default(),
            password: options.password.as_deref(),
        };
        let body = serde_json::to_string(&body)
            .map_err(|e| Error::validation(format!("Failed to serialize room options, {e}")))?;

        debug!(room_id, "creating room");

        let params = RequestParams::post(body).bearer(auth_token);
        self.http
            .service_request(endpoint(base, &["rooms"])?, params)
            .await
    }
}
