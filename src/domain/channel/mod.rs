//! Channel domain: channels, direct messages and channel membership.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::millis_to_datetime;

pub use wire::{ChannelPatch, CreateChannel};

// ─── ChannelType ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
    #[serde(other)]
    Unknown,
}

// ─── Channel ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    /// Empty for direct and group messages.
    pub team_id: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub display_name: String,
    pub name: String,
    pub header: String,
    pub purpose: String,
    pub last_post_at: i64,
    pub total_msg_count: i64,
    pub creator_id: String,
}

impl Channel {
    pub fn last_post_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.last_post_at)
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.channel_type, ChannelType::Direct | ChannelType::Group)
    }

    pub fn is_archived(&self) -> bool {
        self.delete_at != 0
    }
}

// ─── ChannelMember ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMember {
    pub channel_id: String,
    pub user_id: String,
    pub roles: String,
    pub last_viewed_at: i64,
    pub msg_count: i64,
    pub mention_count: i64,
    pub last_update_at: i64,
    pub notify_props: HashMap<String, serde_json::Value>,
}
