//! Response types: the raw HTTP response and the endpoint result wrapper.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::ApiResult;

/// A response as it came off the wire.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RawResponse {
    pub(crate) fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value by case-insensitive name, if present and valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Result of an endpoint call.
///
/// `Parsed` when the status was one the endpoint recognises and parsing is
/// enabled; `Raw` otherwise, so callers can inspect what the server sent.
#[derive(Debug, Clone)]
pub enum Response<T> {
    Parsed(T),
    Raw(RawResponse),
}

impl<T> Response<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// The decoded value, if any.
    pub fn parsed(self) -> Option<T> {
        match self {
            Self::Parsed(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&RawResponse> {
        match self {
            Self::Parsed(_) => None,
            Self::Raw(r) => Some(r),
        }
    }
}

impl<T: DeserializeOwned> Response<T> {
    /// The decoded value; a raw response is decoded from its body.
    pub fn into_result(self) -> ApiResult<T> {
        match self {
            Self::Parsed(v) => Ok(v),
            Self::Raw(r) => r.json(),
        }
    }
}
