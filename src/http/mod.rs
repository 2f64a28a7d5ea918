//! HTTP layer: `Transport`, request parts, raw and parsed responses.

pub mod client;
pub mod request;
pub mod response;

pub use client::Transport;
pub use request::{Body, FilePart, Multipart, Query, RequestParts};
pub use response::{RawResponse, Response};
