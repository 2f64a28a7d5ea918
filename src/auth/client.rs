//! Auth sub-client: login exchange, logout, token and current user.

use crate::auth::Credential;
use crate::client::Client;
use crate::domain::user::User;
use crate::error::{ApiError, ApiResult};
use crate::http::{RequestParts, Transport};
use crate::network::{LOGIN_PATH, LOGOUT_PATH, TOKEN_HEADER};

/// Sub-client for authentication operations.
pub struct Auth<'a> {
    pub(crate) client: &'a Client,
}

impl<'a> Auth<'a> {
    /// Install the configured credential as the active token.
    ///
    /// A bearer token is stored as is. Login credentials go through
    /// `POST /users/login` on an unauthenticated transport; the token comes
    /// from the `Token` response header and the body becomes the current
    /// user. Calling again repeats the exchange and the latest token wins.
    pub async fn authenticate(&self) -> ApiResult<()> {
        let _gate = self.client.login_gate.lock().await;
        self.exchange().await
    }

    /// Run the exchange again, e.g. after the session expired.
    pub async fn relogin(&self) -> ApiResult<()> {
        self.authenticate().await
    }

    /// Log out on the server, then forget the token and current user.
    ///
    /// Local state is cleared even when the server call fails; that failure
    /// is still returned.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = if self.client.token.is_set().await {
            let transport = self.client.open_transport()?;
            let result = transport.post(LOGOUT_PATH, RequestParts::new()).await;
            transport.close();
            result.map(|_| ())
        } else {
            Ok(())
        };

        self.client.token.clear().await;
        *self.client.current_user.write().await = None;
        tracing::info!("Logged out");

        result
    }

    /// User returned by the last login exchange.
    pub async fn current_user(&self) -> Option<User> {
        self.client.current_user.read().await.clone()
    }

    pub async fn active_token(&self) -> Option<String> {
        self.client.token.get().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.client.token.is_set().await
    }

    /// Exchange without taking the login gate; callers hold it.
    pub(crate) async fn exchange(&self) -> ApiResult<()> {
        let credential = self.client.options.auth().ok_or_else(|| {
            ApiError::Authentication("no credential configured".to_string())
        })?;

        if let Credential::BearerToken(token) = credential {
            self.client.token.set(token.clone()).await;
            tracing::debug!("Installed bearer token");
            return Ok(());
        }
        let request = credential.login_request().ok_or_else(|| {
            ApiError::Authentication("credential has no login request".to_string())
        })?;

        let transport = Transport::open(self.client.options.clone(), None)?;
        let result = transport
            .post(LOGIN_PATH, RequestParts::new().json(&request)?)
            .await;
        transport.close();
        let raw = result?;

        let token = raw
            .header(TOKEN_HEADER)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::Authentication(format!(
                    "login succeeded with status {} but no {} header",
                    raw.status(),
                    TOKEN_HEADER
                ))
            })?
            .to_string();

        let user = match raw.json::<User>() {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Login response body is not a user: {}", e);
                None
            }
        };

        self.client.token.set(token).await;
        *self.client.current_user.write().await = user;
        tracing::info!(login_id = %request.login_id, "Logged in");
        Ok(())
    }
}
