//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Results cross the boundary as a heap `FfiDeepvizResult` holding a status
//! code and an owned C string. Lists are opaque: C callers only hold a
//! pointer and go through `deepviz_list_*`.

use std::ffi::CString;
use std::os::raw::c_char;

use deepviz_core::{BoundedList, DeepvizResult, ResultStatus};

/// Opaque handle to a `BoundedList`.
pub struct FfiDeepvizList {
    pub(crate) inner: BoundedList,
}

/// Outcome category, same discriminants as `ResultStatus`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStatus {
    Success = 0,
    InputError = 1,
    NetworkError = 2,
    ClientError = 3,
    ServerError = 4,
    InternalError = 5,
    Processing = 6,
}

impl From<ResultStatus> for FfiStatus {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Success => FfiStatus::Success,
            ResultStatus::InputError => FfiStatus::InputError,
            ResultStatus::NetworkError => FfiStatus::NetworkError,
            ResultStatus::ClientError => FfiStatus::ClientError,
            ResultStatus::ServerError => FfiStatus::ServerError,
            ResultStatus::InternalError => FfiStatus::InternalError,
            ResultStatus::Processing => FfiStatus::Processing,
        }
    }
}

/// Result of every operation. `msg` is never null and is released together
/// with the struct by `deepviz_result_free`.
#[repr(C)]
pub struct FfiDeepvizResult {
    pub status: FfiStatus,
    pub msg: *mut c_char,
}

impl FfiDeepvizResult {
    pub(crate) fn from_core(result: DeepvizResult) -> *mut Self {
        Self::boxed(result.status.into(), result.message)
    }

    /// Result for a panic caught at the boundary.
    pub(crate) fn panic(function: &str) -> *mut Self {
        Self::boxed(FfiStatus::InternalError, format!("panic in {function}"))
    }

    fn boxed(status: FfiStatus, message: String) -> *mut Self {
        Box::into_raw(Box::new(FfiDeepvizResult {
            status,
            msg: c_string(message).into_raw(),
        }))
    }
}

/// Convert to a C string, dropping interior NUL bytes.
pub(crate) fn c_string(message: String) -> CString {
    match CString::new(message) {
        Ok(s) => s,
        Err(e) => {
            let mut bytes = e.into_vec();
            bytes.retain(|&b| b != 0);
            CString::new(bytes).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_discriminants_match_core() {
        for status in [
            ResultStatus::Success,
            ResultStatus::InputError,
            ResultStatus::NetworkError,
            ResultStatus::ClientError,
            ResultStatus::ServerError,
            ResultStatus::InternalError,
            ResultStatus::Processing,
        ] {
            assert_eq!(FfiStatus::from(status) as u32, status.code());
        }
    }

    #[test]
    fn interior_nul_is_dropped() {
        let s = c_string("a\0b".to_string());
        assert_eq!(s.to_str().unwrap(), "ab");
    }
}
