//! Wire types exchanged with RelayBox services
//!
//! Field names follow the services' camelCase JSON.

use relaybox_security::ClientId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default lifetime of tokens returned by [`crate::RelayBox::generate_token_response`]
pub const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 900;

/// A signed token together with its lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Compact signed token
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    /// Expiry as Unix milliseconds
    pub expires_at: i64,
}

/// Parameters for [`crate::RelayBox::generate_token_response`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponseParams {
    /// Bearer identity; the string `"null"` is ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    /// Lifetime in seconds, [`DEFAULT_TOKEN_EXPIRY_SECS`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Permissions as supplied by the caller, validated before issuance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,
}

impl TokenResponseParams {
    /// Empty parameters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bearer identity
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<ClientId>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the lifetime in seconds
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: u64) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Set the permissions
    #[must_use]
    pub fn with_permissions(mut self, permissions: Value) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

/// Target of a publish: one room or several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomTarget {
    /// A single room
    Single(String),
    /// A fan-out to several rooms
    Multiple(Vec<String>),
}

impl RoomTarget {
    /// Whether no room is named
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(room) => room.is_empty(),
            Self::Multiple(rooms) => rooms.is_empty(),
        }
    }
}

impl From<&str> for RoomTarget {
    fn from(room: &str) -> Self {
        Self::Single(room.to_string())
    }
}

impl From<String> for RoomTarget {
    fn from(room: String) -> Self {
        Self::Single(room)
    }
}

impl From<Vec<String>> for RoomTarget {
    fn from(rooms: Vec<String>) -> Self {
        Self::Multiple(rooms)
    }
}

impl From<&[&str]> for RoomTarget {
    fn from(rooms: &[&str]) -> Self {
        Self::Multiple(rooms.iter().map(|room| (*room).to_string()).collect())
    }
}

/// Delivery options attached to a published event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOptions {
    /// Publish on behalf of this client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Deliver without persisting to history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient: Option<bool>,
}

/// Acknowledgement returned by the core service for a publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResponseData {
    /// Acceptance time, as reported by the service (string or number)
    pub timestamp: Value,
    /// Service signature over the accepted event
    pub signature: String,
}

/// Room visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomVisibility {
    /// Anyone may join
    #[default]
    Public,
    /// Invitation only
    Private,
    /// Password protected
    Protected,
    /// Joinable with a room access token
    Authorized,
}

/// Role of the creating member in a new room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMemberType {
    /// Room owner
    Owner,
    /// Administrator
    Admin,
    /// Regular member
    #[default]
    Member,
}

/// Options for [`crate::rooms::Rooms::create`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOptions {
    /// Display name
    #[serde(default)]
    pub room_name: Option<String>,
    /// Visibility, public by default
    #[serde(default)]
    pub visibility: Option<RoomVisibility>,
    /// Creator's role, member by default
    #[serde(default)]
    pub member_type: Option<RoomMemberType>,
    /// Password for protected rooms
    #[serde(default)]
    pub password: Option<String>,
}

/// A room as returned by the state service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Caller-chosen room id
    pub id: String,
    /// Service-assigned identifier
    pub uuid: String,
    /// Visibility
    pub visibility: RoomVisibility,
}

/// A user known to the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Service-assigned user id
    pub id: String,
    /// Client id the user connects with
    pub client_id: String,
    /// ISO-8601 creation time
    pub created_at: String,
    /// ISO-8601 time of the last update
    pub updated_at: String,
    /// Display name
    pub username: String,
    /// Owning organisation
    pub org_id: String,
    /// Whether the user has a live connection
    pub is_online: bool,
    /// ISO-8601 time the user was last seen
    pub last_online: String,
    /// Application the user belongs to
    pub app_id: String,
    /// Set when the user has been blocked
    pub blocked_at: Option<String>,
}

/// An authenticated user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserIdentity {
    /// Identity id
    pub id: String,
    /// Access token issued for the identity
    pub access_token: String,
}

/// Connection session attached to webhook deliveries
///
/// Fields the platform adds later are kept in `extra`, so a deserialized
/// session serializes back to the value that was signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session id
    pub uid: String,
    /// Application public id
    pub app_pid: String,
    /// API key id the session authenticated with
    pub key_id: String,
    /// Connected client
    pub client_id: String,
    /// Session expiry (Unix seconds)
    pub exp: i64,
    /// ISO-8601 session start
    pub timestamp: String,
    /// Connection id
    pub connection_id: String,
    /// Socket id
    pub socket_id: String,
    /// Authenticated user, if any. Written as `null` when absent.
    #[serde(default)]
    pub user: Option<AuthUser>,
    /// Unmodelled fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A webhook delivery
///
/// Optional fields are written as `null` when absent and unknown fields are
/// kept in `extra`. A delivery that omits an optional field therefore does
/// not serialize back byte-for-byte; verify the raw body with
/// [`crate::RelayBox::verify_webhook_signature`] before deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Delivery id
    pub id: String,
    /// Event name, e.g. `room:join`
    pub event: String,
    /// Event data
    pub data: Value,
    /// Session that produced the event
    pub session: Session,
    /// ISO-8601 delivery time
    pub timestamp: String,
    /// Attributes used to route the delivery
    #[serde(default)]
    pub filter_attributes: Option<Map<String, Value>>,
    /// Unmodelled fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_target_untagged() {
        assert_eq!(serde_json::to_value(RoomTarget::from("chat")).unwrap(), json!("chat"));
        assert_eq!(
            serde_json::to_value(RoomTarget::from(&["a", "b"][..])).unwrap(),
            json!(["a", "b"])
        );
        assert!(RoomTarget::from(Vec::new()).is_empty());
        assert!(RoomTarget::from("").is_empty());
    }

    #[test]
    fn test_room_enums_lowercase() {
        assert_eq!(serde_json::to_value(RoomVisibility::Authorized).unwrap(), json!("authorized"));
        assert_eq!(serde_json::to_value(RoomMemberType::Owner).unwrap(), json!("owner"));
        assert_eq!(RoomVisibility::default(), RoomVisibility::Public);
        assert_eq!(RoomMemberType::default(), RoomMemberType::Member);
    }

    #[test]
    fn test_webhook_payload_deserializes() {
        let payload: WebhookPayload = serde_json::from_value(json!({
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
                "socketId": "sock-1"
            },
            "timestamp": "2023-11-14T22:13:21.000Z",
            "filterAttributes": { "region": "eu" }
        }))
        .unwrap();

        assert_eq!(payload.session.app_pid, "appPid");
        assert_eq!(payload.session.user, None);
        assert_eq!(payload.filter_attributes.unwrap()["region"], json!("eu"));
        assert!(payload.extra.is_empty());
    }

    #[test]
    fn test_auth_user_nullable_blocked_at() {
        let user: AuthUser = serde_json::from_value(json!({
            "id": "1",
            "clientId": "client-1",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z",
            "username": "alice",
            "orgId": "org",
            "isOnline": true,
            "lastOnline": "2024-01-01T00:00:00.000Z",
            "appId": "app",
            "blockedAt": null
        }))
        .unwrap();

        assert!(user.is_online);
        assert_eq!(user.blocked_at, None);
    }

    #[test]
    fn test_token_params_from_json() {
        let params: TokenResponseParams = serde_json::from_value(json!({
            "clientId": ["a", "b"],
            "permissions": ["*"]
        }))
        .unwrap();

        assert_eq!(params.expires_in, None);
        assert_eq!(
            params.client_id,
            Some(ClientId::Multiple(vec!["a".into(), "b".into()]))
        );
    }
}
