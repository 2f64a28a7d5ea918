//! Request bodies for channel endpoints.

use serde::Serialize;

use crate::domain::channel::ChannelType;

/// Body of `POST /channels`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateChannel {
    pub team_id: String,
    pub name: String,
    pub display_name: String,
    /// `Open` or `Private`; direct channels go through `create_direct`.
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl CreateChannel {
    pub fn open(
        team_id: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            name: name.into(),
            display_name: display_name.into(),
            channel_type: ChannelType::Open,
            ..Self::default()
        }
    }

    pub fn private(
        team_id: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            channel_type: ChannelType::Private,
            ..Self::open(team_id, name, display_name)
        }
    }
}

/// Body of `PUT /channels/{channel_id}/patch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

/// Body of `POST /channels/{channel_id}/members`.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AddChannelMember<'a> {
    pub user_id: &'a str,
}
