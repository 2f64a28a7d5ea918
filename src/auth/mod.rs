//! Authentication: credentials, the login exchange, and the active token.
//!
//! ## Token model
//!
//! - A [`Credential`] is what the caller configured: a bearer token to use as
//!   is, or login credentials to exchange once via `POST /users/login`.
//! - The [`ActiveToken`] is the bearer currently in use. It outlives any
//!   single authentication attempt, so it lives outside the credential.
//!   Only the authenticator writes it; the HTTP transport and the WebSocket
//!   consumer read it.
//! - The login response carries the token in the `Token` header, never in the
//!   body. The body is the authenticated user, kept as the current user.

#[cfg(feature = "http")]
pub mod client;

use std::fmt;

use serde::Serialize;

/// Configured way of authenticating.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Used directly as `Authorization: Bearer <token>`.
    BearerToken(String),
    /// Exchanged once for a session token.
    LoginCredentials {
        login_id: String,
        password: String,
        mfa_token: Option<String>,
    },
}

impl Credential {
    /// The login request body, for login credentials.
    pub fn login_request(&self) -> Option<LoginRequest> {
        match self {
            Self::BearerToken(_) => None,
            Self::LoginCredentials {
                login_id,
                password,
                mfa_token,
            } => Some(LoginRequest {
                login_id: login_id.clone(),
                password: password.clone(),
                mfa_token: mfa_token.clone(),
            }),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BearerToken(_) => f.debug_tuple("BearerToken").field(&"<redacted>").finish(),
            Self::LoginCredentials {
                login_id,
                mfa_token,
                ..
            } => f
                .debug_struct("LoginCredentials")
                .field("login_id", login_id)
                .field("password", &"<redacted>")
                .field("mfa_token", &mfa_token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Body of `POST /users/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_token: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login_id", &self.login_id)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "http")]
pub use token::ActiveToken;

#[cfg(feature = "http")]
mod token {
    use std::sync::Arc;

    use async_lock::RwLock;

    /// Shared cell holding the current bearer token.
    #[derive(Clone, Default)]
    pub struct ActiveToken {
        inner: Arc<RwLock<Option<String>>>,
    }

    impl ActiveToken {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn get(&self) -> Option<String> {
            self.inner.read().await.clone()
        }

        pub async fn is_set(&self) -> bool {
            self.inner.read().await.is_some()
        }

        pub(crate) async fn set(&self, token: String) {
            *self.inner.write().await = Some(token);
        }

        pub(crate) async fn clear(&self) {
            *self.inner.write().await = None;
        }
    }

    impl std::fmt::Debug for ActiveToken {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("ActiveToken(<redacted>)")
        }
    }
}
