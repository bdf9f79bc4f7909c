//! C-ABI wrapper around `deepviz-core`.
//!
//! # Overview
//! Exposes every Deepviz operation through `extern "C"` functions that take
//! C strings and opaque list handles and return a heap `FfiDeepvizResult`.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary; a caught panic becomes `InternalError`.
//! - A null or non-UTF-8 string argument is treated as absent, so required
//!   arguments report the usual "missing parameters" input error.
//! - All calls share one process-wide client, configured from the
//!   environment on first use (`DEEPVIZ_BASE_URL`).
//! - The C caller owns every returned pointer. `deepviz_result_free` and
//!   `deepviz_list_free` take the address of the caller's pointer and null it.

pub mod types;

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, UnwindSafe};
use std::sync::OnceLock;

use deepviz_core::{AdvancedSearch, BoundedList, ClientConfig, DeepvizClient, DeepvizResult};
use tracing::debug;

use types::*;

static CLIENT: OnceLock<DeepvizClient> = OnceLock::new();

fn client() -> &'static DeepvizClient {
    CLIENT.get_or_init(|| {
        let config = ClientConfig::from_env();
        debug!(base_url = %config.base_url, "deepviz client initialized");
        DeepvizClient::from_config(&config)
    })
}

/// Borrow a C string argument. Null and invalid UTF-8 read as absent.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Required string argument; absent reads as empty, which validation rejects.
unsafe fn required<'a>(ptr: *const c_char) -> &'a str {
    unsafe { str_arg(ptr) }.unwrap_or_default()
}

/// # Safety
/// `ptr` must be null or a live list from `deepviz_list_init`.
unsafe fn list_arg<'a>(ptr: *const FfiDeepvizList) -> Option<&'a BoundedList> {
    unsafe { ptr.as_ref() }.map(|list| &list.inner)
}

fn guard(function: &str, op: impl FnOnce() -> DeepvizResult + UnwindSafe) -> *mut FfiDeepvizResult {
    catch_unwind(op)
        .map(FfiDeepvizResult::from_core)
        .unwrap_or_else(|_| FfiDeepvizResult::panic(function))
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// Allocate a list with `max_entry_number` empty slots.
///
/// Returns null when `max_entry_number` is zero. Free with `deepviz_list_free`.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_list_init(max_entry_number: usize) -> *mut FfiDeepvizList {
    catch_unwind(|| match BoundedList::new(max_entry_number) {
        Some(inner) => Box::into_raw(Box::new(FfiDeepvizList { inner })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Copy `value` into the first free slot of `list`.
///
/// Returns false when either pointer is null, `value` is empty, not UTF-8 or
/// 255 bytes or longer, or the list is full.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_list_add(list: *mut FfiDeepvizList, value: *const c_char) -> bool {
    catch_unwind(|| {
        let Some(list) = (unsafe { list.as_mut() }) else {
            return false;
        };
        let Some(value) = (unsafe { str_arg(value) }) else {
            return false;
        };
        list.inner.add(value).is_ok()
    })
    .unwrap_or(false)
}

/// Free the list `*list` points to and set `*list` to null. Safe to call
/// with null or with a pointer to null.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_list_free(list: *mut *mut FfiDeepvizList) {
    if list.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let handle = unsafe { &mut *list };
        if !handle.is_null() {
            drop(unsafe { Box::from_raw(*handle) });
            *handle = std::ptr::null_mut();
        }
    });
}

/// Free the result `*result` points to, including its message, and set
/// `*result` to null. Safe to call with null or with a pointer to null.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_result_free(result: *mut *mut FfiDeepvizResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let handle = unsafe { &mut *result };
        if handle.is_null() {
            return;
        }
        let boxed = unsafe { Box::from_raw(*handle) };
        if !boxed.msg.is_null() {
            drop(unsafe { std::ffi::CString::from_raw(boxed.msg) });
        }
        *handle = std::ptr::null_mut();
    });
}

/// Library version as a static C string. Must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_version() -> *const c_char {
    const VERSION: &CStr = match CStr::from_bytes_with_nul(concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes()) {
        Ok(version) => version,
        Err(_) => c"unknown",
    };
    VERSION.as_ptr()
}

// ---------------------------------------------------------------------------
// Sandbox
// ---------------------------------------------------------------------------

/// Submit the file at `path` for analysis.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_upload_sample(api_key: *const c_char, path: *const c_char) -> *mut FfiDeepvizResult {
    guard("deepviz_upload_sample", || unsafe {
        client().upload_sample(required(api_key), required(path))
    })
}

/// Submit every file below `folder`.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_upload_folder(api_key: *const c_char, folder: *const c_char) -> *mut FfiDeepvizResult {
    guard("deepviz_upload_folder", || unsafe {
        client().upload_folder(required(api_key), required(folder))
    })
}

/// Download sample `md5` into the directory `path`.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_sample_download(
    md5: *const c_char,
    api_key: *const c_char,
    path: *const c_char,
) -> *mut FfiDeepvizResult {
    guard("deepviz_sample_download", || unsafe {
        client().sample_download(required(md5), required(api_key), required(path))
    })
}

/// Report of sample `md5`; `filters` may be null for the full report.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_sample_report(
    md5: *const c_char,
    api_key: *const c_char,
    filters: *const FfiDeepvizList,
) -> *mut FfiDeepvizResult {
    guard("deepviz_sample_report", || unsafe {
        client().sample_report(required(md5), required(api_key), list_arg(filters))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn deepviz_sample_result(md5: *const c_char, api_key: *const c_char) -> *mut FfiDeepvizResult {
    guard("deepviz_sample_result", || unsafe {
        client().sample_result(required(md5), required(api_key))
    })
}

/// Request an archive of the listed samples. On success `msg` holds the
/// request id.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_bulk_download_request(
    md5_list: *const FfiDeepvizList,
    api_key: *const c_char,
) -> *mut FfiDeepvizResult {
    guard("deepviz_bulk_download_request", || unsafe {
        client().bulk_download_request(list_arg(md5_list), required(api_key))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn deepviz_bulk_download_retrieve(
    id_request: *const c_char,
    path: *const c_char,
    api_key: *const c_char,
) -> *mut FfiDeepvizResult {
    guard("deepviz_bulk_download_retrieve", || unsafe {
        client().bulk_download_retrieve(required(id_request), required(path), required(api_key))
    })
}

// ---------------------------------------------------------------------------
// Threat intelligence
// ---------------------------------------------------------------------------

/// Pass either `ip_list` or `time_delta`, the other must be null.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_ip_info(
    api_key: *const c_char,
    ip_list: *const FfiDeepvizList,
    time_delta: *const c_char,
    history: bool,
) -> *mut FfiDeepvizResult {
    guard("deepviz_ip_info", || unsafe {
        client().ip_info(required(api_key), list_arg(ip_list), str_arg(time_delta), history)
    })
}

/// Pass either `domain` or `time_delta`, the other must be null.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_domain_info(
    api_key: *const c_char,
    domain: *const FfiDeepvizList,
    time_delta: *const c_char,
    history: bool,
    filters: *const FfiDeepvizList,
) -> *mut FfiDeepvizResult {
    guard("deepviz_domain_info", || unsafe {
        client().domain_info(
            required(api_key),
            list_arg(domain),
            str_arg(time_delta),
            history,
            list_arg(filters),
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn deepviz_search(
    api_key: *const c_char,
    search_string: *const c_char,
    start_offset: c_int,
    elements: c_int,
) -> *mut FfiDeepvizResult {
    guard("deepviz_search", || unsafe {
        client().search(required(api_key), required(search_string), start_offset, elements)
    })
}

/// Every list and string filter may be null.
#[unsafe(no_mangle)]
pub extern "C" fn deepviz_advanced_search(
    api_key: *const c_char,
    sim_hash: *const FfiDeepvizList,
    created_files: *const FfiDeepvizList,
    imp_hash: *const FfiDeepvizList,
    url: *const FfiDeepvizList,
    strings: *const FfiDeepvizList,
    ip: *const FfiDeepvizList,
    asn: *const FfiDeepvizList,
    classification: *const c_char,
    rules: *const FfiDeepvizList,
    country: *const FfiDeepvizList,
    never_seen: bool,
    time_delta: *const c_char,
    ip_range: *const c_char,
    domain: *const FfiDeepvizList,
    start_offset: c_int,
    elements: c_int,
) -> *mut FfiDeepvizResult {
    guard("deepviz_advanced_search", || unsafe {
        let filters = AdvancedSearch {
            sim_hash: list_arg(sim_hash),
            created_files: list_arg(created_files),
            imp_hash: list_arg(imp_hash),
            url: list_arg(url),
            strings: list_arg(strings),
            ip: list_arg(ip),
            asn: list_arg(asn),
            classification: str_arg(classification),
            rules: list_arg(rules),
            country: list_arg(country),
            never_seen,
            time_delta: str_arg(time_delta),
            ip_range: str_arg(ip_range),
            domain: list_arg(domain),
        };
        client().advanced_search(required(api_key), &filters, start_offset, elements)
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
