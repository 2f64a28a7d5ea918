//! Endpoint groups organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Response types as the server sends them
//! - `wire.rs`: Request bodies and query parameters (unset fields omitted)
//! - `client.rs`: Endpoint group with the HTTP methods

pub mod channel;
pub mod file;
pub mod post;
pub mod system;
pub mod team;
pub mod user;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// `{"status":"OK"}` acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusOk {
    pub status: String,
}

impl StatusOk {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Paging for list endpoints. Unset fields use the server defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }
}

/// Convert a server timestamp (milliseconds since the epoch).
///
/// `0` means "never" on the server side and maps to `None`.
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    if millis == 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis).single()
}

/// URL-encode one path parameter.
#[cfg(feature = "http")]
pub(crate) fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}
