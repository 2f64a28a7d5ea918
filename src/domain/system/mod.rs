//! System domain: server health.

#[cfg(feature = "http")]
pub mod client;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Result of `GET /system/ping`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPing {
    /// `OK` when the server is healthy.
    pub status: String,
    /// Extra health fields returned when the server status is requested.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SystemPing {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
