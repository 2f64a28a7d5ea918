//! Channels sub-client: channels, DMs and membership.

use reqwest::Method;

use crate::client::Api;
use crate::domain::channel::wire::AddChannelMember;
use crate::domain::channel::{Channel, ChannelMember, ChannelPatch, CreateChannel};
use crate::domain::{segment, PageParams, StatusOk};
use crate::error::ApiResult;
use crate::http::{Query, RequestParts, Response};

pub struct Channels<'a> {
    pub(crate) api: Api<'a>,
}

impl<'a> Channels<'a> {
    pub async fn get(&self, channel_id: &str) -> ApiResult<Response<Channel>> {
        let path = format!("/channels/{}", segment(channel_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn get_by_name(&self, team_id: &str, name: &str) -> ApiResult<Response<Channel>> {
        let path = format!(
            "/teams/{}/channels/name/{}",
            segment(team_id),
            segment(name)
        );
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn create(&self, channel: &CreateChannel) -> ApiResult<Response<Channel>> {
        self.api
            .send(
                Method::POST,
                "/channels",
                RequestParts::new().json(channel)?,
                &[201],
            )
            .await
    }

    /// Open (or fetch the existing) direct channel between two users.
    pub async fn create_direct(&self, user_a: &str, user_b: &str) -> ApiResult<Response<Channel>> {
        self.api
            .send(
                Method::POST,
                "/channels/direct",
                RequestParts::new().json(&[user_a, user_b])?,
                &[201],
            )
            .await
    }

    pub async fn patch(
        &self,
        channel_id: &str,
        patch: &ChannelPatch,
    ) -> ApiResult<Response<Channel>> {
        let path = format!("/channels/{}/patch", segment(channel_id));
        self.api
            .send(Method::PUT, &path, RequestParts::new().json(patch)?, &[200])
            .await
    }

    /// Archive the channel.
    pub async fn delete(&self, channel_id: &str) -> ApiResult<Response<StatusOk>> {
        let path = format!("/channels/{}", segment(channel_id));
        self.api
            .send(Method::DELETE, &path, RequestParts::new(), &[200])
            .await
    }

    /// Channels the user belongs to within one team.
    pub async fn for_user_in_team(
        &self,
        user_id: &str,
        team_id: &str,
    ) -> ApiResult<Response<Vec<Channel>>> {
        let path = format!(
            "/users/{}/teams/{}/channels",
            segment(user_id),
            segment(team_id)
        );
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn members(
        &self,
        channel_id: &str,
        page: &PageParams,
    ) -> ApiResult<Response<Vec<ChannelMember>>> {
        let path = format!("/channels/{}/members", segment(channel_id));
        let parts = RequestParts::new().query(Query::from_serialize(page)?);
        self.api.send(Method::GET, &path, parts, &[200]).await
    }

    pub async fn add_member(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> ApiResult<Response<ChannelMember>> {
        let path = format!("/channels/{}/members", segment(channel_id));
        let body = AddChannelMember { user_id };
        self.api
            .send(Method::POST, &path, RequestParts::new().json(&body)?, &[201])
            .await
    }

    pub async fn remove_member(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> ApiResult<Response<StatusOk>> {
        let path = format!(
            "/channels/{}/members/{}",
            segment(channel_id),
            segment(user_id)
        );
        self.api
            .send(Method::DELETE, &path, RequestParts::new(), &[200])
            .await
    }
}
