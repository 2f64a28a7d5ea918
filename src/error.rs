//! Unified SDK error types.
//!
//! Every failed REST call surfaces as an [`ApiError`]. The HTTP status of a
//! failed response selects the variant; anything outside the fixed table
//! (other statuses, transport failures, decode failures, login protocol
//! violations) collapses into the generic kind.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Result alias used across the SDK.
pub type ApiResult<T> = Result<T, ApiError>;

/// Coarse classification of an [`ApiError`], one per status in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidOrMissingParameters,
    NoAccessTokenProvided,
    NotEnoughPermissions,
    ResourceNotFound,
    MethodNotAllowed,
    ContentTooLarge,
    TooManyRequests,
    InternalServerError,
    FeatureDisabled,
    GenericApiError,
}

impl ErrorKind {
    /// Map an HTTP error status to its kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidOrMissingParameters,
            401 => Self::NoAccessTokenProvided,
            403 => Self::NotEnoughPermissions,
            404 => Self::ResourceNotFound,
            405 => Self::MethodNotAllowed,
            413 => Self::ContentTooLarge,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            501 => Self::FeatureDisabled,
            _ => Self::GenericApiError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidOrMissingParameters => "invalid_or_missing_parameters",
            Self::NoAccessTokenProvided => "no_access_token_provided",
            Self::NotEnoughPermissions => "not_enough_permissions",
            Self::ResourceNotFound => "resource_not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::ContentTooLarge => "content_too_large",
            Self::TooManyRequests => "too_many_requests",
            Self::InternalServerError => "internal_server_error",
            Self::FeatureDisabled => "feature_disabled",
            Self::GenericApiError => "generic_api_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the server told us about a failed request.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetails {
    /// HTTP status of the response.
    pub status: u16,
    /// `message` from the JSON error body, or the raw body text.
    pub message: String,
    /// The whole decoded error body, when it was JSON.
    pub detail: Option<serde_json::Value>,
}

impl ErrorDetails {
    /// Build details from a raw error body.
    ///
    /// A JSON object body contributes its `message` field and becomes the
    /// structured detail. Anything else is kept verbatim as the message.
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => {
                let message = value
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| body.to_string());
                Self {
                    status,
                    message,
                    detail: Some(value),
                }
            }
            _ => Self {
                status,
                message: body.to_string(),
                detail: None,
            },
        }
    }

    /// Decode the structured detail into the standard server error shape.
    pub fn server_error(&self) -> Option<ServerErrorBody> {
        self.detail
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)
    }
}

/// Standard Mattermost error body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerErrorBody {
    pub id: String,
    pub message: String,
    pub request_id: String,
    pub status_code: u16,
    pub detailed_error: Option<String>,
    pub is_oauth: Option<bool>,
}

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid or missing parameters: {0}")]
    InvalidOrMissingParameters(ErrorDetails),

    #[error("No access token provided: {0}")]
    NoAccessTokenProvided(ErrorDetails),

    #[error("Not enough permissions: {0}")]
    NotEnoughPermissions(ErrorDetails),

    #[error("Resource not found: {0}")]
    ResourceNotFound(ErrorDetails),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(ErrorDetails),

    #[error("Content too large: {0}")]
    ContentTooLarge(ErrorDetails),

    #[error("Too many requests: {0}")]
    TooManyRequests(ErrorDetails),

    #[error("Internal server error: {0}")]
    InternalServerError(ErrorDetails),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(ErrorDetails),

    /// Any other non-2xx status.
    #[error("API error: {0}")]
    Generic(ErrorDetails),

    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport is closed")]
    TransportClosed,
}

impl ApiError {
    /// Build the error for a failed HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let details = ErrorDetails::from_body(status, body);
        match ErrorKind::from_status(status) {
            ErrorKind::InvalidOrMissingParameters => Self::InvalidOrMissingParameters(details),
            ErrorKind::NoAccessTokenProvided => Self::NoAccessTokenProvided(details),
            ErrorKind::NotEnoughPermissions => Self::NotEnoughPermissions(details),
            ErrorKind::ResourceNotFound => Self::ResourceNotFound(details),
            ErrorKind::MethodNotAllowed => Self::MethodNotAllowed(details),
            ErrorKind::ContentTooLarge => Self::ContentTooLarge(details),
            ErrorKind::TooManyRequests => Self::TooManyRequests(details),
            ErrorKind::InternalServerError => Self::InternalServerError(details),
            ErrorKind::FeatureDisabled => Self::FeatureDisabled(details),
            ErrorKind::GenericApiError => Self::Generic(details),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOrMissingParameters(_) => ErrorKind::InvalidOrMissingParameters,
            Self::NoAccessTokenProvided(_) => ErrorKind::NoAccessTokenProvided,
            Self::NotEnoughPermissions(_) => ErrorKind::NotEnoughPermissions,
            Self::ResourceNotFound(_) => ErrorKind::ResourceNotFound,
            Self::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            Self::ContentTooLarge(_) => ErrorKind::ContentTooLarge,
            Self::TooManyRequests(_) => ErrorKind::TooManyRequests,
            Self::InternalServerError(_) => ErrorKind::InternalServerError,
            Self::FeatureDisabled(_) => ErrorKind::FeatureDisabled,
            _ => ErrorKind::GenericApiError,
        }
    }

    /// Server details, for errors produced from an HTTP response.
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::InvalidOrMissingParameters(d)
            | Self::NoAccessTokenProvided(d)
            | Self::NotEnoughPermissions(d)
            | Self::ResourceNotFound(d)
            | Self::MethodNotAllowed(d)
            | Self::ContentTooLarge(d)
            | Self::TooManyRequests(d)
            | Self::InternalServerError(d)
            | Self::FeatureDisabled(d)
            | Self::Generic(d) => Some(d),
            _ => None,
        }
    }

    /// HTTP status, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        #[cfg(feature = "http")]
        {
            if let Self::Request(e) = self {
                return e.status().map(|s| s.as_u16());
            }
        }
        self.details().map(|d| d.status)
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        match self.details() {
            Some(d) => d.message.clone(),
            None => self.to_string(),
        }
    }

    /// Structured detail: the decoded error body, or the underlying cause
    /// for transport-level failures.
    pub fn detail(&self) -> Option<serde_json::Value> {
        match self {
            #[cfg(feature = "http")]
            Self::Request(e) => Some(serde_json::json!({
                "cause": e.to_string(),
                "timeout": e.is_timeout(),
                "connect": e.is_connect(),
            })),
            Self::Decode(e) => Some(serde_json::json!({ "cause": e.to_string() })),
            _ => self.details().and_then(|d| d.detail.clone()),
        }
    }
}

/// WebSocket errors. These never reach the caller of the consumer; the
/// supervisor logs them and moves to BACKOFF.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("Handshake timed out")]
    HandshakeTimeout,

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },

    #[error("Auth error: {0}")]
    Auth(#[from] ApiError),
}

#[cfg(feature = "ws-native")]
impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match err {
            Error::ConnectionClosed | Error::AlreadyClosed => WsError::Closed {
                code: None,
                reason: "connection closed".to_string(),
            },
            Error::Io(e) => WsError::ConnectionFailed(e.to_string()),
            Error::Url(e) => WsError::ConnectionFailed(e.to_string()),
            Error::Http(resp) => {
                WsError::ConnectionFailed(format!("HTTP error: {}", resp.status()))
            }
            other => WsError::ProtocolError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for WsError {
    fn from(err: serde_json::Error) -> Self {
        WsError::DeserializationError(err.to_string())
    }
}
