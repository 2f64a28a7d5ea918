//! Post domain: messages, threads and post lists.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::millis_to_datetime;

pub use wire::{ChannelPostsParams, CreatePost, PostPatch, SearchPosts};

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub edit_at: i64,
    pub delete_at: i64,
    pub is_pinned: bool,
    pub user_id: String,
    pub channel_id: String,
    /// Id of the thread root; empty for a root post.
    pub root_id: String,
    pub original_id: String,
    pub message: String,
    /// Empty for regular messages, `system_*` for system messages.
    #[serde(rename = "type")]
    pub post_type: String,
    pub props: HashMap<String, serde_json::Value>,
    pub hashtags: String,
    pub file_ids: Vec<String>,
    pub pending_post_id: String,
    pub reply_count: i64,
}

impl Post {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.create_at)
    }

    pub fn edited_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.edit_at)
    }

    pub fn is_reply(&self) -> bool {
        !self.root_id.is_empty()
    }

    pub fn is_system(&self) -> bool {
        self.post_type.starts_with("system_")
    }
}

// ─── PostList ────────────────────────────────────────────────────────────────

/// Posts keyed by id, with `order` giving the display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostList {
    pub order: Vec<String>,
    pub posts: HashMap<String, Post>,
    pub next_post_id: String,
    pub prev_post_id: String,
}

impl PostList {
    /// Posts in `order`; ids without a matching post are skipped.
    pub fn iter(&self) -> impl Iterator<Item = &Post> + '_ {
        self.order.iter().filter_map(|id| self.posts.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_list_follows_order() {
        let list: PostList = serde_json::from_str(
            r#"{
                "order": ["p2", "p1", "gone"],
                "posts": {
                    "p1": {"id": "p1", "message": "first", "create_at": 1700000000000},
                    "p2": {"id": "p2", "message": "second", "root_id": "p1"}
                }
            }"#,
        )
        .unwrap();
        let messages: Vec<&str> = list.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, ["second", "first"]);
        assert_eq!(list.len(), 3);
        assert!(list.posts["p2"].is_reply());
        assert!(list.posts["p1"].created_at().is_some());
    }

    #[test]
    fn test_system_post() {
        let post: Post =
            serde_json::from_str(r#"{"id":"p","type":"system_join_channel"}"#).unwrap();
        assert!(post.is_system());
        assert!(post.edited_at().is_none());
    }
}
