//! Client configuration: `ClientOptions` and its builder.
//!
//! Options are validated once in [`ClientOptionsBuilder::build`] and are
//! immutable afterwards; changing them means building a new client.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::auth::Credential;
use crate::error::{ApiError, ApiResult};
use crate::network::{derive_ws_url, url_base, DEFAULT_BASE_PATH};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wait between WebSocket reconnect attempts.
pub const DEFAULT_RECONNECT_WAIT: Duration = Duration::from_secs(5);

/// Default per-read timeout on the WebSocket.
pub const DEFAULT_WS_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Default cap on handlers running at once in concurrent dispatch.
pub const DEFAULT_WS_MAX_IN_FLIGHT: usize = 128;

/// How server certificates are verified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsVerification {
    /// Verify against the built-in root store.
    #[default]
    Enabled,
    /// Accept any certificate.
    Disabled,
    /// Verify against an additional PEM CA bundle.
    CustomCa(PathBuf),
}

/// Options for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub tls: TlsVerification,
    /// PEM file holding the client certificate and its private key.
    pub client_cert: Option<PathBuf>,
    /// Proxy URLs keyed by `http`, `https` or `all`.
    pub proxies: BTreeMap<String, String>,
    /// Headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            tls: TlsVerification::Enabled,
            client_cert: None,
            proxies: BTreeMap::new(),
            headers: Vec::new(),
        }
    }
}

/// Immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    base_url: String,
    base_path: String,
    ws_url: String,
    auth: Option<Credential>,
    http: HttpOptions,
    debug: bool,
    ws_reconnect_wait: Duration,
    ws_read_timeout: Duration,
    ws_concurrent: bool,
    ws_max_in_flight: usize,
    ws_relogin: bool,
    skip_response_parsing: bool,
}

impl ClientOptions {
    pub fn builder(base_url: impl Into<String>) -> ClientOptionsBuilder {
        ClientOptionsBuilder::new(base_url)
    }

    /// Server origin, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API prefix, e.g. `/api/v4`.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// `<base_url><base_path>`.
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url, self.base_path)
    }

    /// WebSocket origin (explicit or derived from `base_url`).
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub fn auth(&self) -> Option<&Credential> {
        self.auth.as_ref()
    }

    pub fn http(&self) -> &HttpOptions {
        &self.http
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn ws_reconnect_wait(&self) -> Duration {
        self.ws_reconnect_wait
    }

    pub fn ws_read_timeout(&self) -> Duration {
        self.ws_read_timeout
    }

    pub fn ws_concurrent(&self) -> bool {
        self.ws_concurrent
    }

    pub fn ws_max_in_flight(&self) -> usize {
        self.ws_max_in_flight
    }

    pub fn ws_relogin(&self) -> bool {
        self.ws_relogin
    }

    pub fn skip_response_parsing(&self) -> bool {
        self.skip_response_parsing
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ClientOptionsBuilder {
    base_url: String,
    base_path: String,
    ws_url: Option<String>,
    auth: Option<Credential>,
    http: HttpOptions,
    debug: bool,
    ws_reconnect_wait: Duration,
    ws_read_timeout: Duration,
    ws_concurrent: bool,
    ws_max_in_flight: usize,
    ws_relogin: bool,
    skip_response_parsing: bool,
}

impl ClientOptionsBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            ws_url: None,
            auth: None,
            http: HttpOptions::default(),
            debug: false,
            ws_reconnect_wait: DEFAULT_RECONNECT_WAIT,
            ws_read_timeout: DEFAULT_WS_READ_TIMEOUT,
            ws_concurrent: true,
            ws_max_in_flight: DEFAULT_WS_MAX_IN_FLIGHT,
            ws_relogin: false,
            skip_response_parsing: false,
        }
    }

    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    /// Override the WebSocket origin instead of deriving it.
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.auth = Some(credential);
        self
    }

    /// Authenticate with a personal access token or bot token.
    pub fn token(self, token: impl Into<String>) -> Self {
        self.credential(Credential::BearerToken(token.into()))
    }

    /// Authenticate with a login id (username or email) and password.
    pub fn login(self, login_id: impl Into<String>, password: impl Into<String>) -> Self {
        self.credential(Credential::LoginCredentials {
            login_id: login_id.into(),
            password: password.into(),
            mfa_token: None,
        })
    }

    /// Like [`login`](Self::login), with a one-time MFA code.
    pub fn login_with_mfa(
        self,
        login_id: impl Into<String>,
        password: impl Into<String>,
        mfa_token: impl Into<String>,
    ) -> Self {
        self.credential(Credential::LoginCredentials {
            login_id: login_id.into(),
            password: password.into(),
            mfa_token: Some(mfa_token.into()),
        })
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    /// Turn certificate verification on or off.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.http.tls = if verify {
            TlsVerification::Enabled
        } else {
            TlsVerification::Disabled
        };
        self
    }

    /// Trust an additional PEM CA bundle.
    pub fn ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.http.tls = TlsVerification::CustomCa(path.into());
        self
    }

    /// PEM file with a client certificate and key.
    pub fn client_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.http.client_cert = Some(path.into());
        self
    }

    /// Route `scheme` (`http`, `https` or `all`) through a proxy.
    pub fn proxy(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.http.proxies.insert(scheme.into(), url.into());
        self
    }

    /// Add a default header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.headers.push((name.into(), value.into()));
        self
    }

    pub fn http_options(mut self, http: HttpOptions) -> Self {
        self.http = http;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn ws_reconnect_wait(mut self, wait: Duration) -> Self {
        self.ws_reconnect_wait = wait;
        self
    }

    pub fn ws_read_timeout(mut self, timeout: Duration) -> Self {
        self.ws_read_timeout = timeout;
        self
    }

    /// Dispatch events concurrently (`true`, default) or one at a time.
    pub fn ws_concurrent(mut self, concurrent: bool) -> Self {
        self.ws_concurrent = concurrent;
        self
    }

    pub fn ws_max_in_flight(mut self, max: usize) -> Self {
        self.ws_max_in_flight = max;
        self
    }

    /// Re-run authentication before each WebSocket reconnect.
    pub fn ws_relogin(mut self, relogin: bool) -> Self {
        self.ws_relogin = relogin;
        self
    }

    /// Return raw responses from endpoint methods instead of decoding them.
    pub fn skip_response_parsing(mut self, skip: bool) -> Self {
        self.skip_response_parsing = skip;
        self
    }

    pub fn build(self) -> ApiResult<ClientOptions> {
        let base = parse_absolute(&self.base_url, &["http", "https"], "base_url")?;
        let base_url = url_base(&base);

        let base_path = normalize_base_path(&self.base_path);

        let ws_url = match self.ws_url {
            Some(url) => url_base(&parse_absolute(&url, &["ws", "wss"], "ws_url")?),
            None => {
                let derived = derive_ws_url(&base).ok_or_else(|| {
                    ApiError::InvalidConfig(format!("cannot derive ws_url from '{}'", base_url))
                })?;
                url_base(&derived)
            }
        };

        for scheme in self.http.proxies.keys() {
            if !matches!(scheme.as_str(), "http" | "https" | "all") {
                return Err(ApiError::InvalidConfig(format!(
                    "proxy scheme must be http, https or all, got '{}'",
                    scheme
                )));
            }
        }

        if self.ws_max_in_flight == 0 {
            return Err(ApiError::InvalidConfig(
                "ws_max_in_flight must be at least 1".to_string(),
            ));
        }

        Ok(ClientOptions {
            base_url,
            base_path,
            ws_url,
            auth: self.auth,
            http: self.http,
            debug: self.debug,
            ws_reconnect_wait: self.ws_reconnect_wait,
            ws_read_timeout: self.ws_read_timeout,
            ws_concurrent: self.ws_concurrent,
            ws_max_in_flight: self.ws_max_in_flight,
            ws_relogin: self.ws_relogin,
            skip_response_parsing: self.skip_response_parsing,
        })
    }
}

/// Parse an absolute URL usable as a base: a host, an allowed scheme, no
/// credentials, no query or fragment.
fn parse_absolute(raw: &str, schemes: &[&str], field: &str) -> ApiResult<Url> {
    let invalid = |why: &str| {
        ApiError::InvalidConfig(format!(
            "{} must be an absolute {} URL ({}), got '{}'",
            field,
            schemes.join("/"),
            why,
            raw
        ))
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if !schemes.contains(&url.scheme()) {
        return Err(invalid("unsupported scheme"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("credentials are not allowed"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }
    Ok(url)
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
