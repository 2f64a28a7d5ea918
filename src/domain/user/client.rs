//! Users sub-client: accounts, lookups and presence.

use reqwest::Method;

use crate::client::Api;
use crate::domain::segment;
use crate::domain::user::wire::SetStatus;
use crate::domain::user::{
    AutocompleteParams, CreateUser, User, UserAutocomplete, UserListParams, UserPatch, UserStatus,
};
use crate::domain::StatusOk;
use crate::error::ApiResult;
use crate::http::{Query, RequestParts, Response};

pub struct Users<'a> {
    pub(crate) api: Api<'a>,
}

impl<'a> Users<'a> {
    /// Authenticate with the configured credential and return the logged-in
    /// user (`None` for a bearer token, which carries no user).
    pub async fn login(&self) -> ApiResult<Option<User>> {
        let auth = self.api.client().auth();
        auth.authenticate().await?;
        Ok(auth.current_user().await)
    }

    pub async fn get_me(&self) -> ApiResult<Response<User>> {
        self.api
            .send(Method::GET, "/users/me", RequestParts::new(), &[200])
            .await
    }

    pub async fn get(&self, user_id: &str) -> ApiResult<Response<User>> {
        let path = format!("/users/{}", segment(user_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> ApiResult<Response<User>> {
        let path = format!("/users/username/{}", segment(username));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn get_by_usernames(&self, usernames: &[&str]) -> ApiResult<Response<Vec<User>>> {
        self.api
            .send(
                Method::POST,
                "/users/usernames",
                RequestParts::new().json(usernames)?,
                &[200],
            )
            .await
    }

    /// Page through users, optionally filtered by team, channel or activity.
    pub async fn list(&self, params: &UserListParams) -> ApiResult<Response<Vec<User>>> {
        let parts = RequestParts::new().query(Query::from_serialize(params)?);
        self.api.send(Method::GET, "/users", parts, &[200]).await
    }

    pub async fn create(&self, user: &CreateUser) -> ApiResult<Response<User>> {
        self.api
            .send(Method::POST, "/users", RequestParts::new().json(user)?, &[201])
            .await
    }

    pub async fn patch(&self, user_id: &str, patch: &UserPatch) -> ApiResult<Response<User>> {
        let path = format!("/users/{}/patch", segment(user_id));
        self.api
            .send(Method::PUT, &path, RequestParts::new().json(patch)?, &[200])
            .await
    }

    /// Deactivate the account. The user record is kept on the server.
    pub async fn delete(&self, user_id: &str) -> ApiResult<Response<StatusOk>> {
        let path = format!("/users/{}", segment(user_id));
        self.api
            .send(Method::DELETE, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn autocomplete(
        &self,
        params: &AutocompleteParams,
    ) -> ApiResult<Response<UserAutocomplete>> {
        let parts = RequestParts::new().query(Query::from_serialize(params)?);
        self.api
            .send(Method::GET, "/users/autocomplete", parts, &[200])
            .await
    }

    pub async fn get_status(&self, user_id: &str) -> ApiResult<Response<UserStatus>> {
        let path = format!("/users/{}/status", segment(user_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    /// Set presence to `online`, `away`, `dnd` or `offline`.
    pub async fn set_status(&self, user_id: &str, status: &str) -> ApiResult<Response<UserStatus>> {
        let path = format!("/users/{}/status", segment(user_id));
        let body = SetStatus { user_id, status };
        self.api
            .send(Method::PUT, &path, RequestParts::new().json(&body)?, &[200])
            .await
    }
}
