//! Posts sub-client: create, edit, page through and search posts.

use reqwest::Method;

use crate::client::Api;
use crate::domain::post::{ChannelPostsParams, CreatePost, Post, PostList, PostPatch, SearchPosts};
use crate::domain::{segment, StatusOk};
use crate::error::ApiResult;
use crate::http::{Query, RequestParts, Response};

pub struct Posts<'a> {
    pub(crate) api: Api<'a>,
}

impl<'a> Posts<'a> {
    pub async fn create(&self, post: &CreatePost) -> ApiResult<Response<Post>> {
        self.api
            .send(Method::POST, "/posts", RequestParts::new().json(post)?, &[201])
            .await
    }

    pub async fn get(&self, post_id: &str) -> ApiResult<Response<Post>> {
        let path = format!("/posts/{}", segment(post_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn patch(&self, post_id: &str, patch: &PostPatch) -> ApiResult<Response<Post>> {
        let path = format!("/posts/{}/patch", segment(post_id));
        self.api
            .send(Method::PUT, &path, RequestParts::new().json(patch)?, &[200])
            .await
    }

    pub async fn delete(&self, post_id: &str) -> ApiResult<Response<StatusOk>> {
        let path = format!("/posts/{}", segment(post_id));
        self.api
            .send(Method::DELETE, &path, RequestParts::new(), &[200])
            .await
    }

    /// A page of posts in a channel, or everything changed `since` a time.
    pub async fn for_channel(
        &self,
        channel_id: &str,
        params: &ChannelPostsParams,
    ) -> ApiResult<Response<PostList>> {
        let path = format!("/channels/{}/posts", segment(channel_id));
        let parts = RequestParts::new().query(Query::from_serialize(params)?);
        self.api.send(Method::GET, &path, parts, &[200]).await
    }

    /// The root post and all replies of the thread containing `post_id`.
    pub async fn thread(&self, post_id: &str) -> ApiResult<Response<PostList>> {
        let path = format!("/posts/{}/thread", segment(post_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn pin(&self, post_id: &str) -> ApiResult<Response<StatusOk>> {
        let path = format!("/posts/{}/pin", segment(post_id));
        self.api
            .send(Method::POST, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn unpin(&self, post_id: &str) -> ApiResult<Response<StatusOk>> {
        let path = format!("/posts/{}/unpin", segment(post_id));
        self.api
            .send(Method::POST, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn search(
        &self,
        team_id: &str,
        search: &SearchPosts,
    ) -> ApiResult<Response<PostList>> {
        let path = format!("/teams/{}/posts/search", segment(team_id));
        self.api
            .send(Method::POST, &path, RequestParts::new().json(search)?, &[200])
            .await
    }
}
