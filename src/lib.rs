//! # Mattermost SDK
//!
//! Rust client for the Mattermost REST API (v4) and its WebSocket event
//! stream.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: options, errors, domain types (always available)
//! 2. **Auth**: credentials, login exchange, the active bearer token
//! 3. **HTTP**: `Transport` over `reqwest`, request/response plumbing
//! 4. **Client**: `Client`, `Session` and the endpoint groups
//! 5. **WebSocket**: reconnecting event consumer over `tokio-tungstenite`
//! 6. **Blocking**: synchronous adapter over the async client
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mattermost_sdk::prelude::*;
//!
//! let options = ClientOptions::builder("https://chat.example.com")
//!     .login("bot", "secret")
//!     .build()?;
//! let client = Client::new(options);
//!
//! let me = client.users().get_me().await?.into_result()?;
//! let session = client.session()?;
//! let teams = session.teams().for_user(&me.id).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Unified SDK error types.
pub mod error;

/// URL constants and helpers.
pub mod network;

/// Client configuration.
pub mod config;

/// Endpoint groups: response types, wire types, sub-clients.
pub mod domain;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Credentials and the login exchange.
pub mod auth;

// ── Layer 3: HTTP ────────────────────────────────────────────────────────────

/// Transport, request parts and responses.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: Client ──────────────────────────────────────────────────────────

/// `Client`: the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Layer 5: WebSocket ───────────────────────────────────────────────────────

/// WebSocket frames, handlers and the event consumer.
pub mod ws;

// ── Layer 6: Blocking ────────────────────────────────────────────────────────

/// Synchronous adapter.
#[cfg(feature = "blocking")]
pub mod blocking;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Configuration and errors
    pub use crate::auth::Credential;
    pub use crate::config::{ClientOptions, ClientOptionsBuilder, HttpOptions, TlsVerification};
    pub use crate::error::{ApiError, ApiResult, ErrorDetails, ErrorKind, WsError};

    // Domain types
    pub use crate::domain::channel::{
        Channel, ChannelMember, ChannelPatch, ChannelType, CreateChannel,
    };
    pub use crate::domain::file::{FileInfo, FileLink, FileUploadResponse};
    pub use crate::domain::post::{
        ChannelPostsParams, CreatePost, Post, PostList, PostPatch, SearchPosts,
    };
    pub use crate::domain::system::SystemPing;
    pub use crate::domain::team::{Team, TeamListParams, TeamMember, TeamType};
    pub use crate::domain::user::{
        AutocompleteParams, CreateUser, User, UserAutocomplete, UserListParams, UserPatch,
        UserStatus,
    };
    pub use crate::domain::{PageParams, StatusOk};

    // Client
    #[cfg(feature = "http")]
    pub use crate::client::{Api, Client, Endpoints, Session};
    #[cfg(feature = "http")]
    pub use crate::http::{Multipart, Query, RawResponse, RequestParts, Response};

    // WebSocket
    pub use crate::ws::{
        ActionReply, ConnectionState, Handler, HandlerResult, ServerMessage, WsEvent,
    };
    #[cfg(feature = "ws-native")]
    pub use crate::ws::native::{WebSocketConsumer, WsHandle};
}
