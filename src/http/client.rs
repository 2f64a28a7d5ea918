//! Low-level HTTP transport: `Transport`.
//!
//! A transport owns one `reqwest::Client` (and therefore one connection
//! pool). It composes URLs against `<base_url><base_path>`, applies the bearer
//! token, and turns error statuses into [`ApiError`]s. It never retries.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};

use crate::auth::ActiveToken;
use crate::config::{ClientOptions, HttpOptions, TlsVerification};
use crate::error::{ApiError, ApiResult};
use crate::http::request::{Body, RequestParts};
use crate::http::response::RawResponse;
use crate::network::join_url;

static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// HTTP transport bound to one connection pool.
///
/// Cloning is cheap and shares the pool; the pool is released once every
/// clone is gone. [`close`](Self::close) marks the transport unusable.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    id: u64,
    client: Client,
    options: Arc<ClientOptions>,
    /// `None` for the unauthenticated transport used by the login exchange.
    token: Option<ActiveToken>,
    closed: AtomicBool,
}

impl Transport {
    /// Open a transport with a fresh connection pool.
    pub fn open(options: Arc<ClientOptions>, token: Option<ActiveToken>) -> ApiResult<Self> {
        let client = build_client(options.http())?;
        let id = NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(transport = id, "Opened connection pool");
        Ok(Self {
            inner: Arc::new(TransportInner {
                id,
                client,
                options,
                token,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Process-unique id of the underlying pool.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn client_options(&self) -> &ClientOptions {
        &self.inner.options
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Close the transport. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        let first = !self.inner.closed.swap(true, Ordering::SeqCst);
        if first {
            tracing::trace!(transport = self.inner.id, "Closed connection pool");
        }
        first
    }

    /// Full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.inner.options.api_url(), path)
    }

    // ── Verbs ────────────────────────────────────────────────────────────

    pub async fn get(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.request(Method::GET, path, parts).await
    }

    pub async fn post(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.request(Method::POST, path, parts).await
    }

    pub async fn put(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.request(Method::PUT, path, parts).await
    }

    pub async fn patch(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.request(Method::PATCH, path, parts).await
    }

    pub async fn delete(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.request(Method::DELETE, path, parts).await
    }

    pub async fn head(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.request(Method::HEAD, path, parts).await
    }

    pub async fn options(&self, path: &str, parts: RequestParts) -> ApiResult<RawResponse> {
        self.request(Method::OPTIONS, path, parts).await
    }

    /// Issue one request and validate its status.
    ///
    /// Statuses below 400 come back as a [`RawResponse`]; 4xx/5xx become the
    /// matching [`ApiError`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        parts: RequestParts,
    ) -> ApiResult<RawResponse> {
        if self.is_closed() {
            return Err(ApiError::TransportClosed);
        }

        let url = self.url(path);
        let mut req = self.inner.client.request(method.clone(), &url);

        if !parts.query.is_empty() {
            req = req.query(parts.query.pairs());
        }

        for (name, value) in &parts.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(token) = &self.inner.token {
            if let Some(value) = token.get().await {
                req = req.bearer_auth(value);
            }
        }

        req = match parts.body {
            Body::Empty => req,
            Body::Json(value) => req.json(&value),
            Body::Multipart(form) => req.multipart(form.into_form()?),
        };

        if self.inner.options.debug() {
            tracing::debug!(transport = self.inner.id, %method, %url, "Sending request");
        } else {
            tracing::trace!(transport = self.inner.id, %method, %url, "Sending request");
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        if self.inner.options.debug() {
            tracing::debug!(%method, %url, status, bytes = body.len(), "Received response");
        } else {
            tracing::trace!(%method, %url, status, bytes = body.len(), "Received response");
        }

        if status >= 400 {
            let text = String::from_utf8_lossy(&body);
            let err = ApiError::from_response(status, &text);
            tracing::debug!(%method, %url, status, "Request failed: {}", err);
            return Err(err);
        }

        Ok(RawResponse::new(status, headers, body))
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("id", &self.inner.id)
            .field("base", &self.inner.options.api_url())
            .field("authenticated", &self.is_authenticated())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Build the `reqwest` client for the configured HTTP options.
fn build_client(http: &HttpOptions) -> ApiResult<Client> {
    let mut builder = Client::builder()
        .timeout(http.timeout)
        .pool_max_idle_per_host(10);

    let mut headers = HeaderMap::new();
    for (name, value) in &http.headers {
        let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
            ApiError::InvalidConfig(format!("Invalid header name '{}': {}", name, e))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            ApiError::InvalidConfig(format!("Invalid header value for '{}': {}", name, e))
        })?;
        headers.insert(header_name, header_value);
    }
    builder = builder.default_headers(headers);

    match &http.tls {
        TlsVerification::Enabled => {}
        TlsVerification::Disabled => {
            builder = builder.danger_accept_invalid_certs(true);
        }
        TlsVerification::CustomCa(path) => {
            let pem = std::fs::read(path).map_err(|e| {
                ApiError::InvalidConfig(format!("Cannot read CA bundle {}: {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
    }

    if let Some(path) = &http.client_cert {
        let pem = std::fs::read(path).map_err(|e| {
            ApiError::InvalidConfig(format!(
                "Cannot read client certificate {}: {}",
                path.display(),
                e
            ))
        })?;
        builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
    }

    for (scheme, url) in &http.proxies {
        let proxy = match scheme.as_str() {
            "http" => reqwest::Proxy::http(url.as_str())?,
            "https" => reqwest::Proxy::https(url.as_str())?,
            _ => reqwest::Proxy::all(url.as_str())?,
        };
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}
