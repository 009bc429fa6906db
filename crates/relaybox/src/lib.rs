//! # RelayBox - Server-side SDK
//!
//! Issue client tokens, publish signed events, verify webhooks and manage
//! rooms against the RelayBox realtime platform.
//!
//! ## Architecture
//!
//! - [`RelayBox`] - The client facade, built from [`RelayBoxOptions`]
//! - [`config`] - Options, defaults and `RELAYBOX_*` environment loading
//! - [`request`] - HTTP layer mapping transport outcomes into [`Error`]
//! - [`rooms`] - Room access tokens and room creation
//! - [`auth`] - User lookups
//! - [`types`] - Wire types
//!
//! Token, signature and permission primitives live in
//! [`relaybox_security`] and are re-exported as [`security`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relaybox::{RelayBox, RelayBoxOptions, TokenResponseParams};
//! use serde_json::json;
//!
//! # async fn run() -> relaybox::Result<()> {
//! let relaybox = RelayBox::new(RelayBoxOptions::new("appPid.keyId:secretKey"))?;
//!
//! let response = relaybox.generate_token_response(
//!     TokenResponseParams::new()
//!         .with_client_id("client-1")
//!         .with_permissions(json!({ "chat": ["subscribe", "publish"] })),
//! )?;
//! println!("token expires at {}", response.expires_at);
//!
//! relaybox
//!     .publish("chat", "message", json!({ "text": "hello" }), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod auth;
pub mod config;
pub mod request;
pub mod rooms;
pub mod types;
mod validation;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

pub use relaybox_security as security;
pub use relaybox_security::{
    ApiKeyParts, ClientId, Error, ErrorKind, Permission, Permissions, Result, TokenClaims,
    TokenPayload, TokenType,
};

pub use auth::Auth;
pub use config::RelayBoxOptions;
pub use request::{FormattedResponse, HttpClient};
pub use rooms::Rooms;
pub use types::{
    AuthUser, AuthUserIdentity, DEFAULT_TOKEN_EXPIRY_SECS, PublishOptions, PublishResponseData,
    Room, RoomMemberType, RoomOptions, RoomTarget, RoomVisibility, Session, TokenResponse,
    TokenResponseParams, WebhookPayload,
};

use relaybox_security::{signature, token};
use request::{PUBLIC_KEY_HEADER, RequestParams, SIGNATURE_HEADER, endpoint};
use validation::require_params;

/// RelayBox client
///
/// Holds the parsed API key and a pooled HTTP client. Cheap to clone and safe
/// to share across tasks.
#[derive(Debug, Clone)]
pub struct RelayBox {
    api_key: Arc<ApiKeyParts>,
    core_service_url: url::Url,
    http: HttpClient,
    rooms: Rooms,
    auth: Auth,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishBody<'a> {
    event: &'a str,
    room_id: &'a RoomTarget,
    data: &'a Value,
    timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a PublishOptions>,
}

impl RelayBox {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the API key is missing or malformed,
    /// or a configured service URL is invalid.
    pub fn new(options: RelayBoxOptions) -> Result<Self> {
        require_params([("apiKey", !options.api_key().is_empty())])?;

        let api_key = Arc::new(ApiKeyParts::parse(options.api_key())?);
        let core_service_url = options.core_service_url()?;
        let http = HttpClient::new(options.request_timeout())?;

        let rooms = Rooms::new(
            Arc::clone(&api_key),
            options.state_service_url()?,
            http.clone(),
        );
        let auth = Auth::new(
            Arc::clone(&api_key),
            options.auth_service_url()?,
            http.clone(),
        );

        debug!(
            public_key = %api_key.public_key(),
            core_service_url = %core_service_url,
            "relaybox client ready"
        );

        Ok(Self {
            api_key,
            core_service_url,
            http,
            rooms,
            auth,
        })
    }

    /// Build a client from `RELAYBOX_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`RelayBoxOptions::from_env`] and [`RelayBox::new`].
    pub fn from_env() -> Result<Self> {
        Self::new(RelayBoxOptions::from_env()?)
    }

    /// Public half of the API key
    #[must_use]
    pub fn public_key(&self) -> &str {
        self.api_key.public_key()
    }

    /// Core service base URL
    #[must_use]
    pub fn core_service_url(&self) -> &url::Url {
        &self.core_service_url
    }

    /// Room operations
    #[must_use]
    pub fn rooms(&self) -> &Rooms {
        &self.rooms
    }

    /// Auth service operations
    #[must_use]
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Issue an `id_token` for a client.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the permissions are malformed or `expires_in`
    ///   is zero
    /// - `TokenError` if signing fails
    pub fn generate_token_response(&self, params: TokenResponseParams) -> Result<TokenResponse> {
        let expires_in = params.expires_in.unwrap_or(DEFAULT_TOKEN_EXPIRY_SECS);
        let permissions = match &params.permissions {
            Some(value) => Permissions::from_value(value)?,
            None => None,
        };

        let mut payload = TokenPayload::now(self.api_key.public_key())
            .with_token_type(TokenType::IdToken);
        if let Some(permissions) = permissions {
            payload = payload.with_permissions(permissions);
        }
        if let Some(client_id) = params.client_id {
            payload = payload.with_client_id(client_id);
        }

        let token = token::issue(&payload, self.api_key.secret_key(), expires_in)?;
        let lifetime_ms = i64::try_from(expires_in.saturating_mul(1000)).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp_millis().saturating_add(lifetime_ms);

        Ok(TokenResponse {
            token,
            expires_in,
            expires_at,
        })
    }

    /// Publish an event to one or more rooms.
    ///
    /// The body is signed with the secret key and sent to `{core}/events`.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the room target or event is empty, or `data`
    ///   is `null`
    /// - `HTTPRequestError` for non-2xx responses
    /// - `NetworkError` / `TimeoutError` for transport failures
    #[instrument(skip_all, fields(event = %event))]
    pub async fn publish(
        &self,
        room_id: impl Into<RoomTarget>,
        event: &str,
        data: Value,
        options: Option<PublishOptions>,
    ) -> Result<PublishResponseData> {
        let room_id = room_id.into();
        require_params([
            ("roomId", !room_id.is_empty()),
            ("event", !event.is_empty()),
            ("data", !data.is_null()),
        ])?;

        let body = PublishBody {
            event,
            room_id: &room_id,
            data: &data,
            timestamp: Utc::now().timestamp_millis(),
            options: options.as_ref(),
        };
        let body = serde_json::to_string(&body)
            .map_err(|e| Error::signature(format!("Failed to serialize request body, {e}")))?;
        let request_signature = signature::sign(&body, self.api_key.secret_key())?;

        let params = RequestParams::post(body)
            .header(PUBLIC_KEY_HEADER, self.api_key.public_key())
            .header(SIGNATURE_HEADER, request_signature);

        let response = self
            .http
            .request::<PublishResponseData>(endpoint(&self.core_service_url, &["events"])?, params)
            .await?;

        Ok(response.data)
    }

    /// Verify a token issued with this client's API key.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` if the token is malformed, forged or expired.
    pub fn verify_auth_token(&self, token: &str) -> Result<TokenClaims> {
        token::verify(token, self.api_key.secret_key())
    }

    /// Check a webhook delivery's signature.
    ///
    /// `data` is the delivery body exactly as received. It is canonicalized
    /// before signing, so key order does not matter, but explicit `null`s and
    /// fields [`WebhookPayload`] does not model do. Verify the raw body, then
    /// deserialize it.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `signing_key` is empty.
    pub fn verify_webhook_signature(
        &self,
        data: &Value,
        request_signature: &str,
        signing_key: &str,
    ) -> Result<bool> {
        signature::verify_data(data, request_signature, signing_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const API_KEY: &str = "appPid.keyId:12345";

    fn client() -> RelayBox {
        RelayBox::new(RelayBoxOptions::new(API_KEY)).unwrap()
    }

    #[test]
    fn test_new_rejects_missing_key() {
        let err = RelayBox::new(RelayBoxOptions::new("")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Missing required arguments: apiKey");
    }

    #[test]
    fn test_new_rejects_malformed_key() {
        let err = RelayBox::new(RelayBoxOptions::new("appPid.keyId")).unwrap_err();
        assert_eq!(
            err.message,
            r#"API key must be in the format "appId.keyId:secretKey""#
        );
    }

    #[test]
    fn test_default_core_url() {
        assert_eq!(
            client().core_service_url().as_str(),
            "https://gnet.prod.relaybox-services.net/"
        );
        assert_eq!(client().public_key(), "appPid.keyId");
    }

    #[test]
    fn test_generate_token_response_defaults() {
        let relaybox = client();
        let before = Utc::now().timestamp_millis();
        let response = relaybox
            .generate_token_response(TokenResponseParams::new())
            .unwrap();

        assert_eq!(response.expires_in, 900);
        assert!(response.expires_at >= before + 900_000);

        let claims = relaybox.verify_auth_token(&response.token).unwrap();
        assert_eq!(claims.payload.public_key, "appPid.keyId");
        assert_eq!(claims.payload.token_type, TokenType::IdToken);
        assert_eq!(claims.payload.client_id, None);
        assert_eq!(claims.payload.permissions, None);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_generate_token_response_with_claims() {
        let relaybox = client();
        let response = relaybox
            .generate_token_response(
                TokenResponseParams::new()
                    .with_client_id("client-1")
                    .with_expires_in(60)
                    .with_permissions(json!({ "chat": ["subscribe"] })),
            )
            .unwrap();

        let claims = relaybox.verify_auth_token(&response.token).unwrap();
        assert_eq!(claims.payload.client_id, Some(ClientId::from("client-1")));
        assert!(
            claims
                .payload
                .permissions
                .unwrap()
                .allows("chat", Permission::Subscribe)
        );
        assert_eq!(response.expires_in, 60);
    }

    #[test]
    fn test_generate_token_response_drops_null_client() {
        let relaybox = client();
        let response = relaybox
            .generate_token_response(TokenResponseParams::new().with_client_id("null"))
            .unwrap();

        let claims = relaybox.verify_auth_token(&response.token).unwrap();
        assert_eq!(claims.payload.client_id, None);
    }

    #[test]
    fn test_generate_token_response_rejects_bad_permissions() {
        let err = client()
            .generate_token_response(
                TokenResponseParams::new().with_permissions(json!({ "chat": ["dance"] })),
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_verify_auth_token_rejects_foreign_key() {
        let other = RelayBox::new(RelayBoxOptions::new("appPid.keyId:abcde")).unwrap();
        let token = other
            .generate_token_response(TokenResponseParams::new())
            .unwrap()
            .token;

        let err = client().verify_auth_token(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Token);
    }

    #[test]
    fn test_verify_webhook_signature() {
        let data = json!({ "z": 98, "a": 123, "c": 5 });
        let valid = "3980790cdaa428010f2930987bb132d1dfc6a648e4fab3ef79fce85ff6597472";

        let relaybox = client();
        assert!(relaybox.verify_webhook_signature(&data, valid, "abcde").unwrap());
        assert!(!relaybox.verify_webhook_signature(&data, valid, "12345").unwrap());
        assert_eq!(
            relaybox
                .verify_webhook_signature(&data, valid, "")
                .unwrap_err()
                .kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_verify_webhook_signature_keeps_explicit_nulls() {
        let delivery = json!({
            "id": "evt-1",
            "event": "room:join",
            "data": { "roomId": "chat" },
            "session": {
                "uid": "u-1",
                "appPid": "appPid",
                "keyId": "keyId",
                "clientId": "client-1",
                "exp": 1_700_000_900,
                "timestamp": "2023-11-14T22:13:20.000Z",
                "connectionId": "conn-1",
                "socketId": "sock-1",
                "user": null
            },
            "timestamp": "2023-11-14T22:13:21.000Z",
            "filterAttributes": null
        });
        let request_signature = signature::sign_data(&delivery, "whsec").unwrap();

        let relaybox = client();
        assert!(
            relaybox
                .verify_webhook_signature(&delivery, &request_signature, "whsec")
                .unwrap()
        );

        let payload: WebhookPayload = serde_json::from_value(delivery).unwrap();
        assert_eq!(payload.session.user, None);
        assert_eq!(payload.filter_attributes, None);
    }

    #[test]
    fn test_typed_webhook_payload_round_trips_to_signed_value() {
        let delivery = json!({
            "id": "evt-2",
            "event": "message",
            "data": { "text": "hi" },
            "session": {
                "uid": "u-1",
                "appPid": "appPid",
                "keyId": "keyId",
                "clientId": "client-1",
                "exp": 1_700_000_900,
                "timestamp": "2023-11-14T22:13:20.000Z",
                "connectionId": "conn-1",
                "socketId": "sock-1",
                "user": null,
                "region": "eu"
            },
            "timestamp": "2023-11-14T22:13:21.000Z",
            "filterAttributes": null,
            "attempt": 2
        });
        let request_signature = signature::sign_data(&delivery, "whsec").unwrap();

        let payload: WebhookPayload = serde_json::from_value(delivery).unwrap();
        let typed = serde_json::to_value(&payload).unwrap();

        assert!(
            client()
                .verify_webhook_signature(&typed, &request_signature, "whsec")
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_publish_validates_arguments() {
        let relaybox = client();

        let err = relaybox
            .publish("", "", Value::Null, None)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Missing required arguments: roomId, event, data");

        let err = relaybox
            .publish(Vec::<String>::new(), "message", json!({}), None)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Missing required arguments: roomId");
    }

    #[test]
    fn test_room_access_token() {
        let relaybox = client();
        let token = relaybox
            .rooms()
            .generate_access_token("chat", "client-1", 120)
            .unwrap();

        let claims = relaybox.verify_auth_token(&token).unwrap();
        assert_eq!(claims.payload.token_type, TokenType::BasicAccess);
        assert_eq!(claims.payload.room_id.as_deref(), Some("chat"));
        assert_eq!(claims.payload.expires_in, Some(120));
        assert_eq!(claims.exp - claims.iat, 120);
    }

    #[tokio::test]
    async fn test_services_require_urls() {
        let relaybox = client();

        let err = relaybox
            .rooms()
            .create("chat", "token", RoomOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Missing required arguments: stateServiceUrl");

        let err = relaybox.auth().get_user("client-1", "token").await.unwrap_err();
        assert_eq!(err.message, "Missing required arguments: authServiceUrl");
    }
}
