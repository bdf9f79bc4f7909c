//! Recording transport for unit tests.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::http::HttpResponse;
use crate::transport::Transport;

/// A request as the transport saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Json {
        url: String,
        body: String,
    },
    Multipart {
        url: String,
        api_key: String,
        file_name: String,
        content: Vec<u8>,
    },
}

impl Sent {
    pub(crate) fn url(&self) -> &str {
        match self {
            Sent::Json { url, .. } | Sent::Multipart { url, .. } => url,
        }
    }

    /// Parsed JSON body; panics for multipart requests.
    pub(crate) fn json(&self) -> serde_json::Value {
        match self {
            Sent::Json { body, .. } => serde_json::from_str(body).unwrap(),
            Sent::Multipart { url, .. } => panic!("multipart request to {url} has no JSON body"),
        }
    }
}

/// Replays queued responses in order and records every request. An empty
/// queue answers with a connection error.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    sent: Mutex<Vec<Sent>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_ok(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    pub(crate) fn push_err(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn next(&self) -> Result<HttpResponse, TransportError> {
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "no response queued",
            )))
        })
    }
}

impl Transport for FakeTransport {
    fn send(&self, url: &str, json_body: &str) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(Sent::Json {
            url: url.to_string(),
            body: json_body.to_string(),
        });
        self.next()
    }

    fn send_multipart(
        &self,
        url: &str,
        api_key: &str,
        file_name: &str,
        mut file: File,
    ) -> Result<HttpResponse, TransportError> {
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        self.sent.lock().unwrap().push(Sent::Multipart {
            url: url.to_string(),
            api_key: api_key.to_string(),
            file_name: file_name.to_string(),
            content,
        });
        self.next()
    }
}
