//! Error types for the Deepviz client.
//!
//! # Design
//! `ApiError` is what builders propagate with `?`. Each variant maps onto one
//! `ResultStatus`, and `From<ApiError> for DeepvizResult` is the only place
//! where a failure becomes a caller-visible value. `TransportError` is kept
//! separate because a failed exchange is always reported as a network error,
//! whatever the underlying cause.

use thiserror::Error;

use crate::result::{DeepvizResult, ResultStatus};

/// Message used whenever a required argument is absent.
pub const MISSING_PARAMETERS: &str = "Invalid or missing parameters. Please try again!";

/// Failures raised while validating, sending or interpreting a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller supplied missing, contradictory or unusable arguments.
    #[error("{0}")]
    Input(String),

    /// The exchange did not complete, or a download was refused.
    #[error("{0}")]
    Network(String),

    /// The response had an unexpected shape, or a local step failed.
    #[error("{0}")]
    Internal(String),

    /// The request payload could not be serialized to JSON.
    #[error("Error creating HTTP request")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP exchange failed before a response was read.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub fn missing_parameters() -> Self {
        ApiError::Input(MISSING_PARAMETERS.to_string())
    }

    pub fn status(&self) -> ResultStatus {
        match self {
            ApiError::Input(_) => ResultStatus::InputError,
            ApiError::Network(_) | ApiError::Transport(_) => ResultStatus::NetworkError,
            ApiError::Internal(_) | ApiError::Serialization(_) => ResultStatus::InternalError,
        }
    }
}

impl From<ApiError> for DeepvizResult {
    fn from(err: ApiError) -> Self {
        DeepvizResult::new(err.status(), err.to_string())
    }
}

/// Failures of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Error while connecting to Deepviz: {0}")]
    Http(#[from] ureq::Error),

    #[error("Error reading HTTP response: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons `BoundedList::add` refuses an entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("list entries must not be empty")]
    Empty,

    #[error("list entry is {len} bytes long, at most {max} are allowed")]
    TooLong { len: usize, max: usize },

    #[error("list is full ({capacity} entries)")]
    Full { capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_result_statuses() {
        let cases = [
            (ApiError::missing_parameters(), ResultStatus::InputError),
            (ApiError::Network("down".into()), ResultStatus::NetworkError),
            (ApiError::Internal("bad".into()), ResultStatus::InternalError),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn transport_error_becomes_network_result() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let result = DeepvizResult::from(ApiError::from(TransportError::from(io)));
        assert_eq!(result.status, ResultStatus::NetworkError);
        assert_eq!(result.message, "Error reading HTTP response: reset by peer");
    }

    #[test]
    fn serialization_error_message() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let result = DeepvizResult::from(ApiError::from(json_err));
        assert_eq!(result.status, ResultStatus::InternalError);
        assert_eq!(result.message, "Error creating HTTP request");
    }

    #[test]
    fn input_error_keeps_message() {
        let result = DeepvizResult::from(ApiError::missing_parameters());
        assert_eq!(result.status, ResultStatus::InputError);
        assert_eq!(result.message, MISSING_PARAMETERS);
    }
}
