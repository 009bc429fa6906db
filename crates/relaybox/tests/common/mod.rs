//! Common test utilities for integration tests
//!
//! Provides a wiremock-backed stand-in for the core, state and auth services
//! and a client wired to it.

#![allow(dead_code)]

use relaybox::{RelayBox, RelayBoxOptions};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// API key used by every test client
pub const TEST_API_KEY: &str = "appPid.keyId:12345";

/// Public half of [`TEST_API_KEY`]
pub const TEST_PUBLIC_KEY: &str = "appPid.keyId";

/// Secret half of [`TEST_API_KEY`]
pub const TEST_SECRET_KEY: &str = "12345";

/// Mock RelayBox services sharing one server
pub struct MockRelayBoxServer {
    pub server: MockServer,
}

impl MockRelayBoxServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock server
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Client pointing every service at the mock server
    pub fn client(&self) -> RelayBox {
        self.client_with_timeout(Duration::from_secs(5))
    }

    /// Client with a custom request deadline
    pub fn client_with_timeout(&self, timeout: Duration) -> RelayBox {
        let options = RelayBoxOptions::new(TEST_API_KEY)
            .with_core_service_url(self.uri())
            .with_state_service_url(self.uri())
            .with_auth_service_url(self.uri())
            .with_request_timeout(timeout);

        RelayBox::new(options).expect("mock client options are valid")
    }

    /// Accept publishes with a canned acknowledgement
    pub async fn mock_publish_success(&self) {
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(publish_ack()))
            .mount(&self.server)
            .await;
    }

    /// Reject publishes with the given status
    pub async fn mock_publish_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "message": "Rejected"
            })))
            .mount(&self.server)
            .await;
    }

    /// Accept publishes, but only after `delay`
    pub async fn mock_publish_delayed(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(publish_ack())
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Every request the server has received so far
    pub async fn received(&self) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .expect("request recording is enabled")
    }
}

/// Acknowledgement body returned for a publish
pub fn publish_ack() -> Value {
    json!({
        "timestamp": "2024-01-01T00:00:00.000Z",
        "signature": "ack-signature"
    })
}

/// A user document as the auth service returns it
pub fn auth_user(client_id: &str) -> Value {
    json!({
        "id": "9f2c",
        "clientId": client_id,
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-02T00:00:00.000Z",
        "username": "alice",
        "orgId": "org-1",
        "isOnline": false,
        "lastOnline": "2024-01-02T00:00:00.000Z",
        "appId": "app-1",
        "blockedAt": null
    })
}
