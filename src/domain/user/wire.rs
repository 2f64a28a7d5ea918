//! Request bodies and query parameters for user endpoints.

use serde::Serialize;

/// Body of `POST /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl CreateUser {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

/// Body of `PUT /users/{user_id}/patch`. Only set fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Query of `GET /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_in_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_in_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// Query of `GET /users/autocomplete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutocompleteParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Body of `PUT /users/{user_id}/status`.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SetStatus<'a> {
    pub user_id: &'a str,
    pub status: &'a str,
}
