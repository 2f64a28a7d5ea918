//! Teams sub-client.

use reqwest::Method;

use crate::client::Api;
use crate::domain::segment;
use crate::domain::team::wire::AddTeamMember;
use crate::domain::team::{Team, TeamListParams, TeamMember};
use crate::domain::PageParams;
use crate::error::ApiResult;
use crate::http::{Query, RequestParts, Response};

pub struct Teams<'a> {
    pub(crate) api: Api<'a>,
}

impl<'a> Teams<'a> {
    pub async fn get(&self, team_id: &str) -> ApiResult<Response<Team>> {
        let path = format!("/teams/{}", segment(team_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn get_by_name(&self, name: &str) -> ApiResult<Response<Team>> {
        let path = format!("/teams/name/{}", segment(name));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn list(&self, params: &TeamListParams) -> ApiResult<Response<Vec<Team>>> {
        let parts = RequestParts::new().query(Query::from_serialize(params)?);
        self.api.send(Method::GET, "/teams", parts, &[200]).await
    }

    /// Teams the user belongs to.
    pub async fn for_user(&self, user_id: &str) -> ApiResult<Response<Vec<Team>>> {
        let path = format!("/users/{}/teams", segment(user_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    pub async fn members(
        &self,
        team_id: &str,
        page: &PageParams,
    ) -> ApiResult<Response<Vec<TeamMember>>> {
        let path = format!("/teams/{}/members", segment(team_id));
        let parts = RequestParts::new().query(Query::from_serialize(page)?);
        self.api.send(Method::GET, &path, parts, &[200]).await
    }

    pub async fn add_member(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> ApiResult<Response<TeamMember>> {
        let path = format!("/teams/{}/members", segment(team_id));
        let body = AddTeamMember { team_id, user_id };
        self.api
            .send(Method::POST, &path, RequestParts::new().json(&body)?, &[201])
            .await
    }
}
