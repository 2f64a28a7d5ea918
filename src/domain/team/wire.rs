//! Request bodies and query parameters for team endpoints.

use serde::Serialize;

/// Query of `GET /teams`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_policy_constrained: Option<bool>,
}

/// Body of `POST /teams/{team_id}/members`.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AddTeamMember<'a> {
    pub team_id: &'a str,
    pub user_id: &'a str,
}
