//! Network constants and URL helpers for the Mattermost API.

use url::Url;

/// Default API prefix on the server origin.
pub const DEFAULT_BASE_PATH: &str = "/api/v4";

/// Path of the event stream, appended to the WebSocket URL.
pub const WEBSOCKET_PATH: &str = "/api/v4/websocket";

/// Login exchange endpoint, relative to the API base.
pub const LOGIN_PATH: &str = "/users/login";

/// Logout endpoint, relative to the API base.
pub const LOGOUT_PATH: &str = "/users/logout";

/// Response header carrying the session token after login.
pub const TOKEN_HEADER: &str = "Token";

/// Join URL pieces with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Derive the WebSocket origin from an HTTP origin.
///
/// `https` becomes `wss` and `http` becomes `ws`; host, port and path are
/// kept. Returns `None` for any other scheme.
pub fn derive_ws_url(base_url: &Url) -> Option<Url> {
    let scheme = match base_url.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return None,
    };
    let mut ws_url = base_url.clone();
    ws_url.set_scheme(scheme).ok()?;
    Some(ws_url)
}

/// Serialized URL without its trailing slash, ready for [`join_url`].
pub fn url_base(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// Full URL of the event stream for a WebSocket origin.
pub fn websocket_endpoint(ws_url: &str) -> String {
    join_url(ws_url, WEBSOCKET_PATH)
}
