//! HTTP transport for the Deepviz API.
//!
//! # Design
//! `Transport` is the seam between request building and the network: one
//! JSON POST and one multipart file POST. `UreqTransport` is the production
//! backend; tests substitute their own implementation. A transport reports
//! `Err` only when no response was obtained. 4xx/5xx answers are data and
//! go through the normalizer. No retries are attempted here.

use std::fs::File;
use std::io::{Cursor, Read};

use tracing::{debug, instrument, warn};
use ureq::http::Response;
use ureq::{Agent, Body, SendBody};
use uuid::Uuid;

use crate::config::{ClientConfig, CLIENT_SOURCE};
use crate::error::TransportError;
use crate::http::HttpResponse;

/// Content type of submitted samples.
pub const SAMPLE_CONTENT_TYPE: &str = "application/x-msdownload";

const ACCEPT_ALL: &str = "*/*";

/// One POST per call, blocking until the whole body has been read.
pub trait Transport: Send + Sync {
    /// POST `json_body` to `url` as `application/json`.
    fn send(&self, url: &str, json_body: &str) -> Result<HttpResponse, TransportError>;

    /// POST `file` to `url` as a multipart form with `api_key`, `source` and
    /// `file` fields. `file_name` is reported as the part's filename.
    fn send_multipart(
        &self,
        url: &str,
        api_key: &str,
        file_name: &str,
        file: File,
    ) -> Result<HttpResponse, TransportError>;
}

/// `ureq`-backed transport. Gzip is negotiated and decoded by the agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(config.connect_timeout))
            .timeout_recv_response(Some(config.read_timeout))
            .timeout_recv_body(Some(config.read_timeout))
            .user_agent(config.user_agent.as_str())
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    #[instrument(skip(self, json_body), fields(bytes = json_body.len()))]
    fn send(&self, url: &str, json_body: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .agent
            .post(url)
            .header("Accept", ACCEPT_ALL)
            .content_type("application/json")
            .send(json_body)
            .inspect_err(|e| warn!(error = %e, "request failed"))?;
        read_response(response)
    }

    #[instrument(skip(self, api_key, file))]
    fn send_multipart(
        &self,
        url: &str,
        api_key: &str,
        file_name: &str,
        file: File,
    ) -> Result<HttpResponse, TransportError> {
        let form = MultipartFrame::new(api_key, file_name);
        let mut reader = form.reader(file);
        let response = self
            .agent
            .post(url)
            .header("Accept", ACCEPT_ALL)
            .content_type(form.content_type())
            .send(SendBody::from_reader(&mut reader))
            .inspect_err(|e| warn!(error = %e, "upload failed"))?;
        read_response(response)
    }
}

/// Read status and body. The body is read without a size cap since sample
/// downloads can be large.
fn read_response(mut response: Response<Body>) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let mut body = Vec::new();
    response
        .body_mut()
        .as_reader()
        .read_to_end(&mut body)
        .inspect_err(|e| warn!(status, error = %e, "failed reading response body"))?;
    debug!(status, bytes = body.len(), "response received");
    Ok(HttpResponse { status, body })
}

/// Everything of a multipart body except the file content: the leading
/// `source` and `api_key` parts plus the header of the `file` part, and the
/// closing delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MultipartFrame {
    boundary: String,
    preamble: Vec<u8>,
    epilogue: Vec<u8>,
}

impl MultipartFrame {
    pub(crate) fn new(api_key: &str, file_name: &str) -> Self {
        let boundary = format!("----DeepvizFormBoundary{}", Uuid::new_v4().simple());
        Self::with_boundary(boundary, api_key, file_name)
    }

    fn with_boundary(boundary: String, api_key: &str, file_name: &str) -> Self {
        let file_name = escape_field(file_name);
        let api_key = escape_field(api_key);
        let preamble = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"source\"\r\n\r\n{CLIENT_SOURCE}\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"api_key\"\r\n\r\n{api_key}\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {SAMPLE_CONTENT_TYPE}\r\n\r\n"
        )
        .into_bytes();
        let epilogue = format!("\r\n--{boundary}--\r\n").into_bytes();
        Self {
            boundary,
            preamble,
            epilogue,
        }
    }

    pub(crate) fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Stream the frame around `content` without buffering the content.
    pub(crate) fn reader<'a, R: Read + 'a>(&'a self, content: R) -> impl Read + 'a {
        Cursor::new(self.preamble.as_slice())
            .chain(content)
            .chain(Cursor::new(self.epilogue.as_slice()))
    }
}

/// Percent-encode the characters that would end a quoted parameter or a
/// header line.
fn escape_field(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
pub(crate) fn frame_to_vec(frame: &MultipartFrame, content: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    frame.reader(content).read_to_end(&mut out)?;
    Ok(out)
}
