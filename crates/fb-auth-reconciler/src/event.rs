//! Provider SDK status events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SDK event fired whenever the user's authorization state changes.
pub const AUTH_RESPONSE_CHANGE: &str = "auth.authResponseChange";

/// Connection status reported by the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionStatus {
    /// Logged into Facebook and the app is authorized.
    Connected,
    /// Logged into Facebook but the app is not authorized.
    NotAuthorized,
    /// Not logged into Facebook, or state cannot be determined.
    Unknown,
    /// Any value the SDK is not documented to send.
    Unrecognized(String),
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::NotAuthorized => "not_authorized",
            ConnectionStatus::Unknown => "unknown",
            ConnectionStatus::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for ConnectionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "connected" => ConnectionStatus::Connected,
            "not_authorized" => ConnectionStatus::NotAuthorized,
            "unknown" => ConnectionStatus::Unknown,
            _ => ConnectionStatus::Unrecognized(raw),
        }
    }
}

impl From<ConnectionStatus> for String {
    fn from(status: ConnectionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity assertion delivered with a connected status.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_request: Option<String>,
}

impl AuthResponse {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            expires_in: None,
            signed_request: None,
        }
    }
}

// Credentials stay out of Debug output.
impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user_id", &self.user_id)
            .field("access_token", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .field(
                "signed_request",
                &self.signed_request.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// A status-change notification from the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub status: ConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_response: Option<AuthResponse>,
}

impl StatusEvent {
    pub fn connected(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            auth_response: Some(AuthResponse::new(user_id, access_token)),
        }
    }

    pub fn not_authorized() -> Self {
        Self {
            status: ConnectionStatus::NotAuthorized,
            auth_response: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: ConnectionStatus::Unknown,
            auth_response: None,
        }
    }

    /// Connected status carrying an identity assertion.
    pub fn connected_identity(&self) -> Option<&AuthResponse> {
        match (&self.status, &self.auth_response) {
            (ConnectionStatus::Connected, Some(auth)) => Some(auth),
            _ => None,
        }
    }
}
