//! User profile and authentication models.

use serde::{Deserialize, Serialize};

/// Server-issued user profile snapshot.
///
/// Mutated only by login, profile fetch, profile update and avatar upload
/// responses. A serialized mirror is persisted alongside the auth token for
/// fast reload; the in-memory copy is authoritative during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub email: String,
    /// Display name shown in the UI (may differ from username)
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Whether the account email has been verified
    #[serde(default)]
    pub is_verified: bool,
    /// Phone number (may be None if not shared)
    #[serde(default)]
    pub phone: Option<String>,
}

/// Current authentication context, owned by the auth service.
///
/// UI layers hold a read-only `watch::Receiver<Session>` and must not render
/// protected surfaces until `initialized` is true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Opaque bearer token, present only while authenticated.
    pub token: Option<String>,
    /// Profile of the signed-in user.
    pub user: Option<UserRecord>,
    /// Set exactly once, when startup reconciliation with the persisted
    /// mirror has finished (authenticated or not).
    pub initialized: bool,
}

impl Session {
    /// True iff both a token and a user record are present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Credentials payload for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Username or email address
    pub identifier: String,
    pub password: String,
}

/// Successful login response: the bearer token plus the user it belongs to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRecord,
}

/// Payload for `POST /auth/register`.
///
/// Registration does not imply login (activation email flow), so there is no
/// token in the response and the session is never touched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial profile update for `PUT /user/profile`. Absent fields are left
/// unchanged server-side.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Payload for `POST /user/change-password`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
