//! WebSocket layer: frames, handlers, connection state.
//!
//! The consumer itself lives in `native.rs` (`ws-native` feature,
//! `tokio-tungstenite`); event dispatch lives in `dispatch.rs`. This module
//! defines the shared frame, handler and state types.

#[cfg(feature = "ws-native")]
pub mod dispatch;

#[cfg(feature = "ws-native")]
pub mod native;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::post::Post;

/// Sequence number of the authentication challenge on every connection.
pub const AUTH_CHALLENGE_SEQ: u64 = 1;

/// Action name of the authentication challenge.
pub const AUTH_CHALLENGE_ACTION: &str = "authentication_challenge";

// ─── Event names ─────────────────────────────────────────────────────────────

pub const EVENT_HELLO: &str = "hello";
pub const EVENT_POSTED: &str = "posted";
pub const EVENT_POST_EDITED: &str = "post_edited";
pub const EVENT_POST_DELETED: &str = "post_deleted";
pub const EVENT_TYPING: &str = "typing";
pub const EVENT_STATUS_CHANGE: &str = "status_change";
pub const EVENT_CHANNEL_VIEWED: &str = "channel_viewed";
pub const EVENT_REACTION_ADDED: &str = "reaction_added";
pub const EVENT_REACTION_REMOVED: &str = "reaction_removed";

// ─── Outbound frames ─────────────────────────────────────────────────────────

/// An action sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionFrame {
    pub seq: u64,
    pub action: String,
    pub data: serde_json::Value,
}

impl ActionFrame {
    pub fn authentication_challenge(token: &str) -> Self {
        Self {
            seq: AUTH_CHALLENGE_SEQ,
            action: AUTH_CHALLENGE_ACTION.to_string(),
            data: serde_json::json!({ "token": token }),
        }
    }
}

// ─── Inbound frames ──────────────────────────────────────────────────────────

/// A frame received from the server: a broadcast event, or the reply to an
/// action this client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Event(WsEvent),
    Reply(ActionReply),
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn event(&self) -> Option<&WsEvent> {
        match self {
            Self::Event(e) => Some(e),
            Self::Reply(_) => None,
        }
    }

    pub fn reply(&self) -> Option<&ActionReply> {
        match self {
            Self::Event(_) => None,
            Self::Reply(r) => Some(r),
        }
    }
}

/// Who an event was broadcast to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Broadcast {
    pub omit_users: Option<HashMap<String, bool>>,
    pub user_id: String,
    pub channel_id: String,
    pub team_id: String,
}

/// A server event, e.g. `posted` or `typing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub broadcast: Broadcast,
    #[serde(default)]
    pub seq: i64,
}

impl WsEvent {
    pub fn is(&self, event: &str) -> bool {
        self.event == event
    }

    /// String field of `data`.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// `data.server_version` of the hello event.
    pub fn server_version(&self) -> Option<&str> {
        self.data_str("server_version")
    }

    /// The post carried by `posted` and `post_edited` events.
    ///
    /// The server sends it as a JSON-encoded string inside `data.post`.
    pub fn post(&self) -> Option<Result<Post, serde_json::Error>> {
        match self.data.get("post")? {
            serde_json::Value::String(raw) => Some(serde_json::from_str(raw)),
            other => Some(serde_json::from_value(other.clone())),
        }
    }
}

/// The server's reply to an action, matched by `seq_reply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReply {
    #[serde(default)]
    pub status: String,
    pub seq_reply: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl ActionReply {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }

    /// Best-effort description of a failed reply.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(err) => err
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
            None => format!("status '{}'", self.status),
        }
    }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// Outcome of handling one frame. Errors are logged, never propagated.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Application callback for incoming frames.
#[derive(Clone)]
pub enum Handler {
    /// Awaited on the runtime.
    Async(Arc<dyn Fn(ServerMessage) -> HandlerFuture + Send + Sync>),
    /// Run on the blocking worker pool.
    Blocking(Arc<dyn Fn(ServerMessage) -> HandlerResult + Send + Sync>),
}

impl Handler {
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(ServerMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Async(Arc::new(move |msg| Box::pin(f(msg))))
    }

    pub fn from_blocking<F>(f: F) -> Self
    where
        F: Fn(ServerMessage) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Async(_) => f.write_str("Handler::Async"),
            Self::Blocking(_) => f.write_str("Handler::Blocking"),
        }
    }
}

// ─── ConnectionState ─────────────────────────────────────────────────────────

/// Where the consumer is in its connect/handshake/run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Authenticating = 1,
    Running = 2,
    Backoff = 3,
    Closed = 4,
}

impl From<u8> for ConnectionState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Authenticating,
            2 => Self::Running,
            3 => Self::Backoff,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connecting => "CONNECTING",
            Self::Authenticating => "AUTHENTICATING",
            Self::Running => "RUNNING",
            Self::Backoff => "BACKOFF",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}
