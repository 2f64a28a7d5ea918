//! High-level client: `Client`, `Session`, and the endpoint-group accessors.
//!
//! Endpoint groups live in `domain/<area>/client.rs`. This module keeps the
//! shared auth state, the call scope every group goes through, and the
//! session that pins calls to one connection pool.

use std::sync::Arc;

use async_lock::{Mutex, RwLock};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::auth::client::Auth;
use crate::auth::ActiveToken;
use crate::config::ClientOptions;
use crate::domain::channel::client::Channels;
use crate::domain::file::client::Files;
use crate::domain::post::client::Posts;
use crate::domain::system::client::System;
use crate::domain::team::client::Teams;
use crate::domain::user::client::Users;
use crate::domain::user::User;
use crate::error::ApiResult;
use crate::http::{RawResponse, RequestParts, Response, Transport};

// Re-export group types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::channel::client::Channels as ChannelsClient;
pub use crate::domain::file::client::Files as FilesClient;
pub use crate::domain::post::client::Posts as PostsClient;
pub use crate::domain::system::client::System as SystemClient;
pub use crate::domain::team::client::Teams as TeamsClient;
pub use crate::domain::user::client::Users as UsersClient;

/// The primary entry point for the SDK.
///
/// Cheap to clone; clones share the active token and the current user.
/// Endpoint groups are reached through [`Endpoints`]:
/// `client.users()`, `client.posts()`, etc.
pub struct Client {
    pub(crate) options: Arc<ClientOptions>,
    pub(crate) token: ActiveToken,
    /// User returned by the last login exchange.
    pub(crate) current_user: Arc<RwLock<Option<User>>>,
    /// Serializes login exchanges so concurrent first calls log in once.
    pub(crate) login_gate: Arc<Mutex<()>>,
}

impl Client {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options: Arc::new(options),
            token: ActiveToken::new(),
            current_user: Arc::new(RwLock::new(None)),
            login_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    /// Open a session: every call made through it shares one connection
    /// pool, which is closed when the session is dropped.
    pub fn session(&self) -> ApiResult<Session> {
        Ok(Session {
            client: self.clone(),
            transport: self.open_transport()?,
        })
    }

    /// Create a WebSocket consumer that feeds server events to `handler`.
    #[cfg(feature = "ws-native")]
    pub fn websocket(&self, handler: crate::ws::Handler) -> crate::ws::native::WebSocketConsumer {
        crate::ws::native::WebSocketConsumer::new(self.clone(), handler)
    }

    /// Authenticate once if a credential is configured and no token is held.
    pub(crate) async fn ensure_authenticated(&self) -> ApiResult<()> {
        if self.options.auth().is_none() || self.token.is_set().await {
            return Ok(());
        }
        let _gate = self.login_gate.lock().await;
        // Another caller may have finished the exchange while we waited.
        if self.token.is_set().await {
            return Ok(());
        }
        self.auth().exchange().await
    }

    pub(crate) fn open_transport(&self) -> ApiResult<Transport> {
        Transport::open(self.options.clone(), Some(self.token.clone()))
    }
}

impl Clone for Client {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            token: self.token.clone(),
            current_user: self.current_user.clone(),
            login_gate: self.login_gate.clone(),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.options.api_url())
            .finish_non_exhaustive()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Session
// ═════════════════════════════════════════════════════════════════════════════

/// A scope that reuses one connection pool for all of its calls.
///
/// The pool is closed exactly once: by [`close`](Self::close) or, at the
/// latest, when the session is dropped (including on early return, panic
/// unwind, or a cancelled future).
pub struct Session {
    client: Client,
    transport: Transport,
}

impl Session {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Close the pool now. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.transport.close()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.transport.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .finish()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Call scope
// ═════════════════════════════════════════════════════════════════════════════

/// Where a call runs: a session's pool, or a fresh pool for this call only.
#[derive(Clone, Copy)]
pub struct Api<'a> {
    client: &'a Client,
    transport: Option<&'a Transport>,
}

impl<'a> Api<'a> {
    pub fn client(&self) -> &'a Client {
        self.client
    }

    /// Authenticate lazily, then issue the request.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        parts: RequestParts,
    ) -> ApiResult<RawResponse> {
        self.client.ensure_authenticated().await?;
        match self.transport {
            Some(transport) => transport.request(method, path, parts).await,
            None => {
                let transient = ClosingTransport(self.client.open_transport()?);
                transient.0.request(method, path, parts).await
            }
        }
    }

    /// Issue the request and decode the body when the status is one of
    /// `success`; any other successful status comes back raw.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        parts: RequestParts,
        success: &[u16],
    ) -> ApiResult<Response<T>> {
        let raw = self.execute(method, path, parts).await?;
        if self.client.options.skip_response_parsing() || !success.contains(&raw.status()) {
            return Ok(Response::Raw(raw));
        }
        Ok(Response::Parsed(raw.json()?))
    }

    // ── Raw verbs ────────────────────────────────────────────────────────

    pub async fn get(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.execute(Method::GET, path, parts).await
    }

    pub async fn post(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.execute(Method::POST, path, parts).await
    }

    pub async fn put(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.execute(Method::PUT, path, parts).await
    }

    pub async fn patch(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.execute(Method::PATCH, path, parts).await
    }

    pub async fn delete(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.execute(Method::DELETE, path, parts).await
    }

    pub async fn head(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.execute(Method::HEAD, path, parts).await
    }

    pub async fn options(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.execute(Method::OPTIONS, path, parts).await
    }
}

/// Per-call transport, closed when the call finishes or is cancelled.
struct ClosingTransport(Transport);

impl Drop for ClosingTransport {
    fn drop(&mut self) {
        self.0.close();
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Endpoint groups
// ═════════════════════════════════════════════════════════════════════════════

/// Accessors for the endpoint groups, shared by [`Client`] and [`Session`].
pub trait Endpoints {
    fn api(&self) -> Api<'_>;

    fn users(&self) -> Users<'_> {
        Users { api: self.api() }
    }

    fn teams(&self) -> Teams<'_> {
        Teams { api: self.api() }
    }

    fn channels(&self) -> Channels<'_> {
        Channels { api: self.api() }
    }

    fn posts(&self) -> Posts<'_> {
        Posts { api: self.api() }
    }

    fn files(&self) -> Files<'_> {
        Files { api: self.api() }
    }

    fn system(&self) -> System<'_> {
        System { api: self.api() }
    }
}

impl Endpoints for Client {
    fn api(&self) -> Api<'_> {
        Api {
            client: self,
            transport: None,
        }
    }
}

impl Endpoints for Session {
    fn api(&self) -> Api<'_> {
        Api {
            client: &self.client,
            transport: Some(&self.transport),
        }
    }
}
