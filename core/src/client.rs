//! Deepviz client: request dispatch shared by every operation.
//!
//! # Design
//! `DeepvizClient` holds only a base URL and a transport, so one instance can
//! serve concurrent callers. Each operation is split into a `build_*` method
//! that validates arguments and produces an `HttpRequest` without I/O, and the
//! operation itself, which dispatches the request and interprets the answer.
//! Operations live in `sandbox` and `intel`; this module carries the plumbing
//! they share.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, RequestBody};
use crate::normalize::normalize;
use crate::result::DeepvizResult;
use crate::transport::{Transport, UreqTransport};

/// Synchronous client for the Deepviz API.
#[derive(Debug, Clone)]
pub struct DeepvizClient<T = UreqTransport> {
    base_url: String,
    transport: T,
}

impl DeepvizClient<UreqTransport> {
    /// Client for the production API with default settings.
    pub fn new() -> Self {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_transport(&config.base_url, UreqTransport::new(config))
    }
}

impl Default for DeepvizClient<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> DeepvizClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    pub(crate) fn json_request<P: serde::Serialize>(
        &self,
        path: &str,
        payload: &P,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload)?;
        Ok(HttpRequest {
            url: self.endpoint(path),
            body: RequestBody::Json(body),
        })
    }

    /// Send `request` and return the raw response. A multipart file is opened
    /// here, so an unreadable file is reported as an input error.
    pub(crate) fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = match &request.body {
            RequestBody::Json(json) => self.transport.send(&request.url, json)?,
            RequestBody::Multipart(form) => {
                let file = open_regular(&form.file_path)
                    .map_err(|e| ApiError::Input(format!("Unable to open file: {e}")))?;
                let file_name = file_name(&form.file_path);
                self.transport
                    .send_multipart(&request.url, &form.api_key, &file_name, file)?
            }
        };
        debug!(url = %request.url, status = response.status, "deepviz responded");
        Ok(response)
    }

    /// Dispatch and normalize.
    pub(crate) fn round_trip(&self, request: &HttpRequest) -> Result<DeepvizResult, ApiError> {
        let response = self.dispatch(request)?;
        Ok(normalize(response.status, &response.body))
    }

    /// Run a built request through `round_trip`, folding every failure into
    /// the result.
    pub(crate) fn execute(&self, request: Result<HttpRequest, ApiError>) -> DeepvizResult {
        request
            .and_then(|request| self.round_trip(&request))
            .unwrap_or_else(DeepvizResult::from)
    }
}

/// Operations refuse to run on targets without a supported HTTP stack.
pub(crate) fn ensure_platform() -> Result<(), ApiError> {
    if cfg!(any(unix, windows)) {
        Ok(())
    } else {
        Err(ApiError::Internal("Platform not supported".to_string()))
    }
}

/// Fail with the common input error when any required argument is empty.
pub(crate) fn require(values: &[&str]) -> Result<(), ApiError> {
    if values.iter().any(|value| value.is_empty()) {
        return Err(ApiError::missing_parameters());
    }
    Ok(())
}

/// Treat an empty optional string as absent.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Open `path` for reading. Directories and other non-regular files open
/// fine on unix but fail on the first read, so they are refused here.
fn open_regular(path: &Path) -> std::io::Result<File> {
    let file = File::open(path)?;
    if !file.metadata()?.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    Ok(file)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::fake::FakeTransport;
    use crate::http::MultipartForm;
    use crate::result::ResultStatus;

    fn client(transport: FakeTransport) -> DeepvizClient<FakeTransport> {
        DeepvizClient::with_transport("https://api.deepviz.test/", transport)
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = client(FakeTransport::new());
        assert_eq!(c.base_url(), "https://api.deepviz.test");
        assert_eq!(c.endpoint("general/report"), "https://api.deepviz.test/general/report");
    }

    #[test]
    fn json_request_serializes_payload() {
        let c = client(FakeTransport::new());
        let req = c
            .json_request("intel/search", &serde_json::json!({"api_key": "k"}))
            .unwrap();
        assert_eq!(req.url, "https://api.deepviz.test/intel/search");
        assert_eq!(req.json(), Some(r#"{"api_key":"k"}"#));
    }

    #[test]
    fn transport_failure_is_network_error() {
        let transport = FakeTransport::new();
        transport.push_err(TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )));
        let c = client(transport);
        let req = c.json_request("intel/search", &serde_json::json!({})).unwrap();

        let result = c.execute(Ok(req));
        assert_eq!(result.status, ResultStatus::NetworkError);
        assert_eq!(result.message, "Error reading HTTP response: connection refused");
    }

    #[test]
    fn execute_normalizes_response() {
        let transport = FakeTransport::new();
        transport.push_ok(404, r#"{"errmsg":"Sample not found"}"#);
        let c = client(transport);
        let req = c.json_request("general/report", &serde_json::json!({})).unwrap();

        let result = c.execute(Ok(req));
        assert_eq!(result.status, ResultStatus::ClientError);
        assert_eq!(result.message, "Error: 404 - Sample not found");
    }

    #[test]
    fn execute_passes_build_errors_through() {
        let c = client(FakeTransport::new());
        let result = c.execute(Err(ApiError::missing_parameters()));
        assert_eq!(result.status, ResultStatus::InputError);
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn multipart_with_missing_file_is_input_error() {
        let c = client(FakeTransport::new());
        let req = HttpRequest {
            url: c.endpoint("sandbox/submit"),
            body: RequestBody::Multipart(MultipartForm {
                api_key: "k".into(),
                file_path: "/definitely/not/here.exe".into(),
            }),
        };
        let err = c.dispatch(&req).unwrap_err();
        assert_eq!(err.status(), ResultStatus::InputError);
        assert!(err.to_string().starts_with("Unable to open file: "));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn require_rejects_empty_values() {
        assert!(require(&["a", "b"]).is_ok());
        assert!(require(&["a", ""]).is_err());
        assert_eq!(present(Some("")), None);
        assert_eq!(present(Some("7d")), Some("7d"));
    }

    #[test]
    fn file_name_uses_last_component() {
        assert_eq!(file_name(Path::new("/tmp/samples/evil.exe")), "evil.exe");
    }
}
