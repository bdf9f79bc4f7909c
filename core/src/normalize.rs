//! Interpretation of Deepviz responses.
//!
//! The server answers with an envelope: `{"data": ...}` on success and
//! `{"errmsg": "..."}` on failure, except that 428 always means the analysis
//! is still running and sample downloads succeed with a raw binary body.

use serde_json::Value;

use crate::error::ApiError;
use crate::result::{DeepvizResult, ResultStatus};

/// Status code the server uses while an analysis is still running.
pub const STATUS_PROCESSING: u16 = 428;

const STATUS_OK: u16 = 200;

/// Map a status code and body to the canonical result.
pub fn normalize(status: u16, body: &[u8]) -> DeepvizResult {
    if status == STATUS_PROCESSING {
        return DeepvizResult::new(
            ResultStatus::Processing,
            format!("Status: {status} - Analysis is running"),
        );
    }
    if body.is_empty() {
        return empty_response();
    }

    let parsed = serde_json::from_slice::<Value>(body);

    if status != STATUS_OK {
        let Ok(envelope) = parsed else {
            return DeepvizResult::new(
                ResultStatus::InternalError,
                format!("Error loading Deepviz response: {status}"),
            );
        };
        let Some(errmsg) = envelope.get("errmsg") else {
            return DeepvizResult::new(
                ResultStatus::InternalError,
                format!("Error while connecting to Deepviz: {status}"),
            );
        };
        let category = match status / 100 {
            4 => ResultStatus::ClientError,
            5 => ResultStatus::ServerError,
            _ => ResultStatus::InternalError,
        };
        return DeepvizResult::new(category, format!("Error: {status} - {}", text(errmsg)));
    }

    let envelope = match parsed {
        Ok(envelope) => envelope,
        Err(e) => {
            return DeepvizResult::new(
                ResultStatus::InternalError,
                format!("Error parsing HTTP response: {e}"),
            );
        }
    };
    match envelope.get("data") {
        Some(data) => DeepvizResult::success(data.to_string()),
        None => DeepvizResult::new(ResultStatus::InternalError, "Error parsing HTTP response"),
    }
}

/// Status check for download endpoints, whose success body is the file
/// itself. Every refusal is reported as a network error.
pub fn check_download(status: u16, body: &[u8]) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::Network("HTTP empty response".to_string()));
    }
    if status == STATUS_OK {
        return Ok(());
    }
    let errmsg = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|envelope| envelope.get("errmsg").map(text));
    let message = match errmsg {
        Some(errmsg) => format!("Error: {status} - {errmsg}"),
        None => format!("Error while connecting to Deepviz: {status}"),
    };
    Err(ApiError::Network(message))
}

fn empty_response() -> DeepvizResult {
    DeepvizResult::new(ResultStatus::NetworkError, "HTTP empty response")
}

/// String values verbatim, anything else as JSON text.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
