//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::Utc;
use relaybox_security::ApiKeyParts;
use serde_json::{Value, json};

/// API key used throughout the integration tests
pub const TEST_API_KEY: &str = "appPid.keyId:12345";

/// Parsed form of [`TEST_API_KEY`]
pub fn test_key() -> ApiKeyParts {
    ApiKeyParts::parse(TEST_API_KEY).expect("test API key is well formed")
}

/// Current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// A webhook delivery as the platform sends it
pub fn webhook_delivery() -> Value {
    json!({
        "id": "d6b0b2f6-1f0e-4b7e-9a4a-2f1c3c1b8e11",
        "event": "room:join",
        "data": { "roomId": "chat", "members": ["a", "b"] },
        "session": {
            "uid": "u-1",
            "appPid": "appPid",
            "keyId": "keyId",
            "clientId": "client-1",
            "exp": 1_700_000_900,
            "timestamp": "2023-11-14T22:13:20.000Z",
            "connectionId": "conn-1",
            "socketId": "sock-1"
        },
        "timestamp": "2023-11-14T22:13:21.000Z"
    })
}
