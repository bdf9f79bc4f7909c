//! The uniform return value of every Deepviz operation.
//!
//! # Design
//! Every operation returns a `DeepvizResult` rather than `Result<_, _>`:
//! `Processing` is a normal outcome, not a failure, and callers of the C ABI
//! need a single shape. Inside the crate, failures travel as `ApiError` and
//! are converted at the operation boundary.

use std::fmt;

/// Outcome category of an operation. Discriminants match the C enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    Success = 0,
    /// Missing or contradictory arguments, or an unusable local path.
    InputError = 1,
    /// The exchange did not complete, or a download was refused.
    NetworkError = 2,
    /// HTTP 4xx with an error envelope.
    ClientError = 3,
    /// HTTP 5xx with an error envelope.
    ServerError = 4,
    /// Unexpected response shape or a local failure.
    InternalError = 5,
    /// HTTP 428: the analysis is still running; poll again later.
    Processing = 6,
}

impl ResultStatus {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Failures a caller may reasonably retry.
    pub fn is_retryable(self) -> bool {
        matches!(self, ResultStatus::NetworkError | ResultStatus::Processing)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultStatus::Success => "Success",
            ResultStatus::InputError => "InputError",
            ResultStatus::NetworkError => "NetworkError",
            ResultStatus::ClientError => "ClientError",
            ResultStatus::ServerError => "ServerError",
            ResultStatus::InternalError => "InternalError",
            ResultStatus::Processing => "Processing",
        };
        f.write_str(name)
    }
}

/// Status plus message. On `Success` the message is the JSON text of the
/// response `data` field, or a summary produced by the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepvizResult {
    pub status: ResultStatus,
    pub message: String,
}

impl DeepvizResult {
    pub fn new(status: ResultStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ResultStatus::Success, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn is_processing(&self) -> bool {
        self.status == ResultStatus::Processing
    }
}

impl fmt::Display for DeepvizResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_declaration_order() {
        assert_eq!(ResultStatus::Success.code(), 0);
        assert_eq!(ResultStatus::InternalError.code(), 5);
        assert_eq!(ResultStatus::Processing.code(), 6);
    }

    #[test]
    fn retryable_statuses() {
        assert!(ResultStatus::NetworkError.is_retryable());
        assert!(ResultStatus::Processing.is_retryable());
        assert!(!ResultStatus::InputError.is_retryable());
        assert!(!ResultStatus::ClientError.is_retryable());
    }

    #[test]
    fn display_includes_status_and_message() {
        let result = DeepvizResult::new(ResultStatus::ClientError, "Error: 404 - not found");
        assert_eq!(result.to_string(), "ClientError: Error: 404 - not found");
    }
}
