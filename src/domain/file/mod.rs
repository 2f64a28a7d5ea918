//! File domain: uploaded attachments and their metadata.

#[cfg(feature = "http")]
pub mod client;

use serde::{Deserialize, Serialize};

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FILE_FIELD: &str = "files";

/// Multipart field naming the target channel.
pub const UPLOAD_CHANNEL_FIELD: &str = "channel_id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    pub id: String,
    pub user_id: String,
    /// Empty until the file is attached to a post.
    pub post_id: String,
    pub channel_id: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    pub name: String,
    pub extension: String,
    pub size: i64,
    pub mime_type: String,
    pub width: i64,
    pub height: i64,
    pub has_preview_image: bool,
}

/// Result of `POST /files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileUploadResponse {
    pub file_infos: Vec<FileInfo>,
    pub client_ids: Vec<String>,
}

impl FileUploadResponse {
    /// Ids to pass as `file_ids` when creating a post.
    pub fn file_ids(&self) -> Vec<String> {
        self.file_infos.iter().map(|f| f.id.clone()).collect()
    }
}

/// Public link to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLink {
    pub link: String,
}
