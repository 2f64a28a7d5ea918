//! User domain: accounts, profiles and presence.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::millis_to_datetime;

pub use wire::{AutocompleteParams, CreateUser, UserListParams, UserPatch};

// ─── User ────────────────────────────────────────────────────────────────────

/// A user account as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub email: String,
    pub email_verified: bool,
    pub auth_service: String,
    /// Space-separated role names, e.g. `system_user system_admin`.
    pub roles: String,
    pub locale: String,
    pub position: String,
    pub is_bot: bool,
    pub bot_description: Option<String>,
    pub last_picture_update: i64,
    pub timezone: HashMap<String, String>,
    pub props: HashMap<String, serde_json::Value>,
}

impl User {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.create_at)
    }

    /// `false` once the account has been deactivated.
    pub fn is_active(&self) -> bool {
        self.delete_at == 0
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.split_whitespace().any(|r| r == role)
    }

    /// Full name if set, otherwise the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Presence of a user: `online`, `away`, `dnd` or `offline`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStatus {
    pub user_id: String,
    pub status: String,
    pub manual: bool,
    pub last_activity_at: i64,
}

/// Result of `GET /users/autocomplete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAutocomplete {
    pub users: Vec<User>,
    pub out_of_channel: Vec<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_tolerates_missing_fields() {
        let user: User = serde_json::from_str(r#"{"id":"u1","username":"alice"}"#).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.username, "alice");
        assert!(user.is_active());
        assert!(user.created_at().is_none());
        assert_eq!(user.display_name(), "alice");
    }

    #[test]
    fn test_user_roles_and_name() {
        let user: User = serde_json::from_str(
            r#"{"id":"u1","username":"alice","first_name":"Alice","last_name":"Liddell",
                "roles":"system_user system_admin","delete_at":1700000000000,
                "props":{"customStatus":""}}"#,
        )
        .unwrap();
        assert!(user.has_role("system_admin"));
        assert!(!user.has_role("admin"));
        assert_eq!(user.display_name(), "Alice Liddell");
        assert!(!user.is_active());
    }
}
