//! HTTP request and response values exchanged with a `Transport`.
//!
//! # Design
//! Builders describe a request as plain data and the client hands it to the
//! transport. Every Deepviz endpoint is a POST, so no method is carried. A
//! multipart upload names the file on disk; the client opens it right before
//! dispatch so an unreadable file is reported as an input error.

use std::path::PathBuf;

/// Body of a request to the Deepviz API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Serialized JSON payload.
    Json(String),
    /// File submission as `multipart/form-data`.
    Multipart(MultipartForm),
}

/// Form fields of a sample submission, besides the constant `source` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    pub api_key: String,
    pub file_path: PathBuf,
}

/// A POST request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub body: RequestBody,
}

impl HttpRequest {
    /// The JSON payload, or `None` for multipart requests.
    pub fn json(&self) -> Option<&str> {
        match &self.body {
            RequestBody::Json(json) => Some(json),
            RequestBody::Multipart(_) => None,
        }
    }
}

/// Status code and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}
