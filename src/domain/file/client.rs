//! Files sub-client: upload, metadata and download.

use reqwest::Method;

use crate::client::Api;
use crate::domain::file::{
    FileInfo, FileLink, FileUploadResponse, UPLOAD_CHANNEL_FIELD, UPLOAD_FILE_FIELD,
};
use crate::domain::segment;
use crate::error::ApiResult;
use crate::http::{Multipart, RequestParts, Response};

pub struct Files<'a> {
    pub(crate) api: Api<'a>,
}

impl<'a> Files<'a> {
    /// Upload one file into a channel. Attach it to a post by passing the
    /// returned id in `CreatePost::file_ids`.
    pub async fn upload(
        &self,
        channel_id: &str,
        filename: &str,
        mime_type: &str,
        data: impl Into<Vec<u8>>,
    ) -> ApiResult<Response<FileUploadResponse>> {
        let form = Multipart::new()
            .text(UPLOAD_CHANNEL_FIELD, channel_id)
            .file(UPLOAD_FILE_FIELD, filename, mime_type, data);
        self.api
            .send(
                Method::POST,
                "/files",
                RequestParts::new().multipart(form),
                &[201],
            )
            .await
    }

    pub async fn get_info(&self, file_id: &str) -> ApiResult<Response<FileInfo>> {
        let path = format!("/files/{}/info", segment(file_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }

    /// File contents as stored on the server.
    pub async fn download(&self, file_id: &str) -> ApiResult<Vec<u8>> {
        let path = format!("/files/{}", segment(file_id));
        let raw = self.api.get(&path, RequestParts::new()).await?;
        Ok(raw.into_bytes())
    }

    pub async fn get_link(&self, file_id: &str) -> ApiResult<Response<FileLink>> {
        let path = format!("/files/{}/link", segment(file_id));
        self.api
            .send(Method::GET, &path, RequestParts::new(), &[200])
            .await
    }
}
