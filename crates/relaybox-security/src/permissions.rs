//! Permission grammar for token claims
//!
//! A token may carry either the global wildcard `["*"]` or a map from room
//! name to a list of capabilities drawn from [`Permission::ALL`]:
//!
//! ```json
//! { "chat:*:123": ["*"], "config": ["publish", "presence"] }
//! ```
//!
//! Caller input is loosely typed JSON. [`validate_permissions`] classifies it
//! once and then checks, in this order:
//!
//! 1. global wildcard shortcut (first element `"*"`, nothing else inspected)
//! 2. forbidden characters in every room key
//! 3. top-level shape (must be a map)
//! 4. each room value is a list
//! 5. each list element belongs to the vocabulary
//!
//! The first failing check determines the error message.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Characters that may not appear in a room key
pub const FORBIDDEN_ROOM_KEY_CHARS: &[char] =
    &['!', '@', '#', '$', '%', '^', '&', ')', '(', '+', '=', '.'];

/// A single capability a token may assert for a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    /// Create rooms
    #[serde(rename = "create")]
    Create,
    /// Join rooms
    #[serde(rename = "join")]
    Join,
    /// Receive events
    #[serde(rename = "subscribe")]
    Subscribe,
    /// Send events
    #[serde(rename = "publish")]
    Publish,
    /// Presence updates
    #[serde(rename = "presence")]
    Presence,
    /// Room metrics
    #[serde(rename = "metrics")]
    Metrics,
    /// Message history
    #[serde(rename = "history")]
    History,
    /// Every capability
    #[serde(rename = "*")]
    All,
}

impl Permission {
    /// The permission vocabulary, in its published order
    pub const ALL: [Permission; 8] = [
        Permission::Create,
        Permission::Join,
        Permission::Subscribe,
        Permission::Publish,
        Permission::Presence,
        Permission::Metrics,
        Permission::History,
        Permission::All,
    ];

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::Join => "join",
            Permission::Subscribe => "subscribe",
            Permission::Publish => "publish",
            Permission::Presence => "presence",
            Permission::Metrics => "metrics",
            Permission::History => "history",
            Permission::All => "*",
        }
    }

    /// The vocabulary joined with `", "`, as used in validation messages
    #[must_use]
    pub fn vocabulary() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Invalid permission '{s}'. Valid permissions are: {}.",
                    Self::vocabulary()
                ))
            })
    }
}

/// Validated permissions as embedded in a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permissions {
    /// Unrestricted access, serialized as `["*"]`
    Global,
    /// Per-room capability lists
    Rooms(BTreeMap<String, Vec<Permission>>),
}

impl Permissions {
    /// Build a per-room permission set, validating room keys.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if any room key contains a forbidden character.
    pub fn rooms<I, K>(rooms: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<Permission>)>,
        K: Into<String>,
    {
        let rooms: BTreeMap<String, Vec<Permission>> =
            rooms.into_iter().map(|(k, v)| (k.into(), v)).collect();

        if rooms.keys().any(|room| has_forbidden_chars(room)) {
            return Err(special_characters_error());
        }

        Ok(Self::Rooms(rooms))
    }

    /// Validate loosely-typed input and convert it into typed permissions.
    ///
    /// Returns `Ok(None)` for `null`. A list whose first element is not
    /// `"*"` becomes a room map keyed by index, so `[]` is embedded in a
    /// token as `{}` and `[["publish"]]` as `{"0":["publish"]}`.
    ///
    /// # Errors
    ///
    /// Returns the `ValidationError` produced by [`validate_permissions`].
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        match classify(value) {
            PermissionInput::Absent => Ok(None),
            PermissionInput::Wildcard => Ok(Some(Self::Global)),
            PermissionInput::Map(entries) => {
                let rooms = check_entries(&entries)?;
                Ok(Some(Self::Rooms(rooms)))
            }
            PermissionInput::Invalid => Err(not_an_object_error()),
        }
    }

    /// JSON form of these permissions
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Global => Value::Array(vec![Value::String(Permission::All.as_str().into())]),
            Self::Rooms(rooms) => Value::Object(
                rooms
                    .iter()
                    .map(|(room, perms)| {
                        let perms = perms
                            .iter()
                            .map(|p| Value::String(p.as_str().into()))
                            .collect();
                        (room.clone(), Value::Array(perms))
                    })
                    .collect(),
            ),
        }
    }

    /// Check whether `permission` is granted for `room`.
    ///
    /// Room keys match literally; a room-level `"*"` grants every capability.
    #[must_use]
    pub fn allows(&self, room: &str, permission: Permission) -> bool {
        match self {
            Self::Global => true,
            Self::Rooms(rooms) => rooms.get(room).is_some_and(|perms| {
                perms
                    .iter()
                    .any(|p| *p == Permission::All || *p == permission)
            }),
        }
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Global => [Permission::All].serialize(serializer),
            Self::Rooms(rooms) => rooms.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .map_err(|e| D::Error::custom(e.message))?
            .ok_or_else(|| D::Error::custom("permissions must not be null"))
    }
}

/// Validate caller-supplied permissions.
///
/// Returns `Ok(true)` when the value is `null`, the global wildcard, or a
/// well-formed room map. Never returns `Ok(false)`.
///
/// # Errors
///
/// Returns a `ValidationError` describing the first rule the value breaks.
///
/// # Example
///
/// ```rust
/// use relaybox_security::permissions::validate_permissions;
/// use serde_json::json;
///
/// assert!(validate_permissions(&json!(["*"])).unwrap());
/// assert!(validate_permissions(&json!({ "chat": ["subscribe", "publish"] })).unwrap());
/// assert!(validate_permissions(&json!({ "chat": ["dance"] })).is_err());
/// ```
pub fn validate_permissions(value: &Value) -> Result<bool> {
    match classify(value) {
        PermissionInput::Absent | PermissionInput::Wildcard => Ok(true),
        PermissionInput::Map(entries) => check_entries(&entries).map(|_| true),
        PermissionInput::Invalid => Err(not_an_object_error()),
    }
}

/// Check whether a single value belongs to the permission vocabulary.
#[must_use]
pub fn is_valid_permission(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| Permission::ALL.iter().any(|p| p.as_str() == s))
}

/// Loosely-typed input, classified once at entry
enum PermissionInput<'a> {
    Absent,
    Wildcard,
    /// Room entries in input order. A non-wildcard list contributes its
    /// elements under the keys `"0"`, `"1"`, ...
    Map(Vec<(String, &'a Value)>),
    Invalid,
}

fn classify(value: &Value) -> PermissionInput<'_> {
    match value {
        Value::Null => PermissionInput::Absent,
        Value::Array(items) if items.first().and_then(Value::as_str) == Some("*") => {
            PermissionInput::Wildcard
        }
        Value::Array(items) => PermissionInput::Map(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        Value::Object(map) => {
            PermissionInput::Map(map.iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        _ => PermissionInput::Invalid,
    }
}

fn check_entries(entries: &[(String, &Value)]) -> Result<BTreeMap<String, Vec<Permission>>> {
    if entries.iter().any(|(room, _)| has_forbidden_chars(room)) {
        return Err(special_characters_error());
    }

    let mut rooms = BTreeMap::new();
    for (room, perms) in entries {
        let Value::Array(perms) = *perms else {
            return Err(Error::validation(format!(
                "Permissions for room '{room}' should be an array containing {}",
                Permission::vocabulary()
            )));
        };

        let mut parsed = Vec::with_capacity(perms.len());
        for perm in perms {
            let permission = perm
                .as_str()
                .and_then(|s| s.parse::<Permission>().ok())
                .ok_or_else(|| {
                    Error::validation(format!(
                        "Invalid permission '{}' found in room '{room}'. Valid permissions are: {}.",
                        display_value(perm),
                        Permission::vocabulary()
                    ))
                })?;
            parsed.push(permission);
        }

        rooms.insert(room.clone(), parsed);
    }

    Ok(rooms)
}

fn has_forbidden_chars(room: &str) -> bool {
    room.contains(FORBIDDEN_ROOM_KEY_CHARS)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn special_characters_error() -> Error {
    Error::validation("Permissions include special characters")
}

fn not_an_object_error() -> Error {
    Error::validation("Permissions should be an object with room keys")
}
