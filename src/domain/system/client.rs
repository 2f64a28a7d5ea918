//! System sub-client.

use reqwest::Method;

use crate::client::Api;
use crate::domain::system::SystemPing;
use crate::error::ApiResult;
use crate::http::{Query, RequestParts, Response};

pub struct System<'a> {
    pub(crate) api: Api<'a>,
}

impl<'a> System<'a> {
    /// Health check. With `get_server_status`, the server also reports the
    /// state of its database and file store.
    pub async fn ping(&self, get_server_status: Option<bool>) -> ApiResult<Response<SystemPing>> {
        let query = Query::new().opt("get_server_status", get_server_status);
        self.api
            .send(
                Method::GET,
                "/system/ping",
                RequestParts::new().query(query),
                &[200],
            )
            .await
    }
}
