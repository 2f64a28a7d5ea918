//! Request building blocks: query strings, bodies, extra headers.

use std::fmt::Display;

use serde::Serialize;

use crate::error::{ApiError, ApiResult};

/// URL query parameters. Unset values never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, rendered with its `Display` form.
    pub fn push(mut self, key: &str, value: impl Display) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a parameter only when it is set.
    pub fn opt<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Build a query from a serializable parameter struct.
    ///
    /// Fields marked `skip_serializing_if = "Option::is_none"` that are unset
    /// are left out entirely.
    pub fn from_serialize<T: Serialize>(params: &T) -> ApiResult<Self> {
        let encoded = serde_urlencoded::to_string(params)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid query parameters: {}", e)))?;
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(&encoded)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid query parameters: {}", e)))?;
        Ok(Self { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// One file section of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// `multipart/form-data` body: named file parts plus named text fields.
///
/// Each field name holds at most one file; adding another file under the
/// same name replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multipart {
    files: Vec<(String, FilePart)>,
    fields: Vec<(String, String)>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(
        mut self,
        name: &str,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        let part = FilePart {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        };
        match self.files.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = part,
            None => self.files.push((name.to_string(), part)),
        }
        self
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn files(&self) -> &[(String, FilePart)] {
        &self.files
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub(crate) fn into_form(self) -> ApiResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for (name, file) in self.files {
            let part = reqwest::multipart::Part::bytes(file.data)
                .file_name(file.filename)
                .mime_str(&file.mime_type)?;
            form = form.part(name, part);
        }
        Ok(form)
    }
}

/// Request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Multipart),
}

/// Everything about a request except its method and path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParts {
    pub query: Query,
    pub body: Body,
    pub headers: Vec<(String, String)>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, form: Multipart) -> Self {
        self.body = Body::Multipart(form);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
