//! Blocking adapter: drives the async client on a private runtime.
//!
//! Wire behaviour is identical to the async [`Client`](crate::client::Client);
//! every call is the async call run to completion on a current-thread tokio
//! runtime owned by the adapter. Do not use it from inside an async context.

use std::future::Future;
use std::pin::Pin;

use tokio::runtime::{Builder, Runtime};

use crate::client::{Client as AsyncClient, Endpoints, Session as AsyncSession};
use crate::config::ClientOptions;
use crate::domain::user::User;
use crate::error::{ApiError, ApiResult};
use crate::http::{RawResponse, RequestParts};

/// Future borrowed from the client or session it was built on.
pub type LocalFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Blocking counterpart of [`crate::client::Client`].
pub struct Client {
    inner: AsyncClient,
    runtime: Runtime,
}

impl Client {
    pub fn new(options: ClientOptions) -> ApiResult<Self> {
        Self::from_async(AsyncClient::new(options))
    }

    /// Wrap an existing async client; the two share auth state.
    pub fn from_async(inner: AsyncClient) -> ApiResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("Failed to create runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    pub fn inner(&self) -> &AsyncClient {
        &self.inner
    }

    pub fn options(&self) -> &ClientOptions {
        self.inner.options()
    }

    /// Run any async operation against the client and wait for it.
    ///
    /// ```rust,ignore
    /// let me = client.call(|c| Box::pin(async move { c.users().get_me().await }))?;
    /// ```
    pub fn call<T>(&self, f: impl for<'a> FnOnce(&'a AsyncClient) -> LocalFuture<'a, T>) -> T {
        self.runtime.block_on(f(&self.inner))
    }

    /// Open a blocking session sharing one connection pool.
    pub fn session(&self) -> ApiResult<Session<'_>> {
        Ok(Session {
            runtime: &self.runtime,
            inner: self.inner.session()?,
        })
    }

    // ── Auth ─────────────────────────────────────────────────────────────

    pub fn authenticate(&self) -> ApiResult<()> {
        self.runtime.block_on(self.inner.auth().authenticate())
    }

    pub fn logout(&self) -> ApiResult<()> {
        self.runtime.block_on(self.inner.auth().logout())
    }

    pub fn active_token(&self) -> Option<String> {
        self.runtime.block_on(self.inner.auth().active_token())
    }

    pub fn current_user(&self) -> Option<User> {
        self.runtime.block_on(self.inner.auth().current_user())
    }

    // ── Raw verbs ────────────────────────────────────────────────────────

    pub fn get(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().get(path, parts))
    }

    pub fn post(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().post(path, parts))
    }

    pub fn put(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().put(path, parts))
    }

    pub fn patch(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().patch(path, parts))
    }

    pub fn delete(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().delete(path, parts))
    }

    pub fn head(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().head(path, parts))
    }

    pub fn options_request(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().options(path, parts))
    }

    /// Run the WebSocket consumer on this thread. Never returns.
    #[cfg(feature = "ws-native")]
    pub fn run_websocket(&self, handler: crate::ws::Handler) {
        self.runtime.block_on(self.inner.websocket(handler).run())
    }
}

/// Blocking counterpart of [`crate::client::Session`]. Closes its pool on
/// drop.
pub struct Session<'c> {
    runtime: &'c Runtime,
    inner: AsyncSession,
}

impl<'c> Session<'c> {
    pub fn inner(&self) -> &AsyncSession {
        &self.inner
    }

    pub fn call<T>(&self, f: impl for<'a> FnOnce(&'a AsyncSession) -> LocalFuture<'a, T>) -> T {
        self.runtime.block_on(f(&self.inner))
    }

    pub fn get(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().get(path, parts))
    }

    pub fn post(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().post(path, parts))
    }

    pub fn put(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().put(path, parts))
    }

    pub fn patch(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().patch(path, parts))
    }

    pub fn delete(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().delete(path, parts))
    }

    pub fn head(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().head(path, parts))
    }

    pub fn options_request(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.runtime.block_on(self.inner.api().options(path, parts))
    }

    pub fn close(&self) -> bool {
        self.inner.close()
    }
}
