//! Sandbox operations: reports, sample submission and downloads.
//!
//! Downloads differ from the other endpoints in two ways. The destination
//! file is created before anything is sent, and every refusal from the server
//! is reported as a network error instead of being classified by status.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::client::{ensure_platform, require, DeepvizClient};
use crate::error::ApiError;
use crate::http::{HttpRequest, MultipartForm, RequestBody};
use crate::list::{populated, BoundedList};
use crate::normalize::check_download;
use crate::result::{DeepvizResult, ResultStatus};
use crate::transport::Transport;
use crate::types::{BulkRequest, BulkRetrieveRequest, BulkTicket, ReportRequest, SampleRequest};

pub const REPORT_PATH: &str = "general/report";
pub const SUBMIT_PATH: &str = "sandbox/submit";
pub const SAMPLE_PATH: &str = "sandbox/sample";
pub const BULK_REQUEST_PATH: &str = "sandbox/sample/bulk/request";
pub const BULK_RETRIEVE_PATH: &str = "sandbox/sample/bulk/retrieve";

const NO_FILTERS: &str = "You must provide one or more output filters in a list. Please try again!";
const NO_HASHES: &str = "You must provide one or more MD5 hashes. Please try again!";

impl<T: Transport> DeepvizClient<T> {
    pub fn build_sample_report(
        &self,
        md5: &str,
        api_key: &str,
        filters: Option<&BoundedList>,
    ) -> Result<HttpRequest, ApiError> {
        require(&[md5, api_key])?;
        let output_filters = match filters {
            Some(list) => Some(populated(Some(list)).ok_or_else(|| ApiError::Input(NO_FILTERS.to_string()))?),
            None => None,
        };
        self.json_request(
            REPORT_PATH,
            &ReportRequest {
                api_key: api_key.to_string(),
                md5: md5.to_string(),
                output_filters,
            },
        )
    }

    /// Fetch the analysis report of `md5`, restricted to `filters` when given.
    pub fn sample_report(
        &self,
        md5: &str,
        api_key: &str,
        filters: Option<&BoundedList>,
    ) -> DeepvizResult {
        self.execute(ensure_platform().and_then(|()| self.build_sample_report(md5, api_key, filters)))
    }

    /// Report restricted to the `classification` section.
    pub fn sample_result(&self, md5: &str, api_key: &str) -> DeepvizResult {
        let mut filters = match BoundedList::new(1) {
            Some(list) => list,
            None => return DeepvizResult::new(ResultStatus::InternalError, "Internal Error"),
        };
        if let Err(e) = filters.add("classification") {
            return DeepvizResult::new(ResultStatus::InternalError, e.to_string());
        }
        self.sample_report(md5, api_key, Some(&filters))
    }

    pub fn build_upload_sample(&self, api_key: &str, path: &Path) -> Result<HttpRequest, ApiError> {
        require(&[api_key])?;
        if path.as_os_str().is_empty() {
            return Err(ApiError::missing_parameters());
        }
        Ok(HttpRequest {
            url: self.endpoint(SUBMIT_PATH),
            body: RequestBody::Multipart(MultipartForm {
                api_key: api_key.to_string(),
                file_path: path.to_path_buf(),
            }),
        })
    }

    /// Submit the file at `path` for analysis. The file is streamed, never
    /// loaded whole.
    pub fn upload_sample(&self, api_key: &str, path: impl AsRef<Path>) -> DeepvizResult {
        let path = path.as_ref();
        self.execute(ensure_platform().and_then(|()| self.build_upload_sample(api_key, path)))
    }

    /// Submit every regular file below `folder`, in file-name order, stopping
    /// at the first file the server does not accept.
    pub fn upload_folder(&self, api_key: &str, folder: impl AsRef<Path>) -> DeepvizResult {
        match self.try_upload_folder(api_key, folder.as_ref()) {
            Ok(()) => DeepvizResult::success("Folder uploaded to Deepviz successfully"),
            Err(e) => e.into(),
        }
    }

    fn try_upload_folder(&self, api_key: &str, folder: &Path) -> Result<(), ApiError> {
        ensure_platform()?;
        require(&[api_key])?;
        if folder.as_os_str().is_empty() {
            return Err(ApiError::missing_parameters());
        }
        if std::fs::read_dir(folder).is_err() {
            return Err(ApiError::Input("Invalid folder".to_string()));
        }

        for entry in WalkDir::new(folder).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ApiError::Input(format!("Invalid folder: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let result = self.upload_sample(api_key, path);
            if !result.is_success() {
                warn!(path = %path.display(), status = %result.status, "folder upload aborted");
                return Err(ApiError::Input(format!(
                    "Error uploading file \"{}\": {} - {}",
                    path.display(),
                    result.status.code(),
                    result.message
                )));
            }
            debug!(path = %path.display(), "uploaded");
        }
        Ok(())
    }

    pub fn build_sample_download(&self, md5: &str, api_key: &str) -> Result<HttpRequest, ApiError> {
        require(&[md5, api_key])?;
        self.json_request(
            SAMPLE_PATH,
            &SampleRequest {
                api_key: api_key.to_string(),
                md5: md5.to_string(),
            },
        )
    }

    /// Download the sample `md5` into `dest_dir/<md5>`.
    pub fn sample_download(
        &self,
        md5: &str,
        api_key: &str,
        dest_dir: impl AsRef<Path>,
    ) -> DeepvizResult {
        let dest_dir = dest_dir.as_ref();
        let outcome = ensure_platform()
            .and_then(|()| require_dir(dest_dir))
            .and_then(|()| self.build_sample_download(md5, api_key))
            .and_then(|request| plain_file_name(md5).map(|()| request))
            .and_then(|request| self.download(&request, dest_dir.join(md5)));
        downloaded(outcome)
    }

    pub fn build_bulk_download_request(
        &self,
        md5_list: Option<&BoundedList>,
        api_key: &str,
    ) -> Result<HttpRequest, ApiError> {
        require(&[api_key])?;
        let list = md5_list.ok_or_else(ApiError::missing_parameters)?;
        let hashes = populated(Some(list)).ok_or_else(|| ApiError::Input(NO_HASHES.to_string()))?;
        self.json_request(
            BULK_REQUEST_PATH,
            &BulkRequest {
                api_key: api_key.to_string(),
                hashes,
            },
        )
    }

    /// Ask the server to bundle the listed samples. On success the message is
    /// the `id_request` to pass to `bulk_download_retrieve`.
    pub fn bulk_download_request(
        &self,
        md5_list: Option<&BoundedList>,
        api_key: &str,
    ) -> DeepvizResult {
        let result =
            self.execute(ensure_platform().and_then(|()| self.build_bulk_download_request(md5_list, api_key)));
        if !result.is_success() {
            return result;
        }
        match serde_json::from_str::<BulkTicket>(&result.message) {
            Ok(ticket) => DeepvizResult::success(ticket.id_request.to_string()),
            Err(_) => DeepvizResult::new(ResultStatus::InternalError, "Error parsing HTTP response"),
        }
    }

    pub fn build_bulk_download_retrieve(
        &self,
        id_request: &str,
        api_key: &str,
    ) -> Result<HttpRequest, ApiError> {
        require(&[id_request, api_key])?;
        self.json_request(
            BULK_RETRIEVE_PATH,
            &BulkRetrieveRequest {
                api_key: api_key.to_string(),
                id_request: id_request.to_string(),
            },
        )
    }

    /// Download the archive of a bulk request into
    /// `dest_dir/bulk_request_<id_request>.zip`.
    pub fn bulk_download_retrieve(
        &self,
        id_request: &str,
        dest_dir: impl AsRef<Path>,
        api_key: &str,
    ) -> DeepvizResult {
        let dest_dir = dest_dir.as_ref();
        let outcome = ensure_platform()
            .and_then(|()| require_dir(dest_dir))
            .and_then(|()| self.build_bulk_download_retrieve(id_request, api_key))
            .and_then(|request| plain_file_name(id_request).map(|()| request))
            .and_then(|request| {
                self.download(&request, dest_dir.join(format!("bulk_request_{id_request}.zip")))
            });
        downloaded(outcome)
    }

    fn download(&self, request: &HttpRequest, target: PathBuf) -> Result<PathBuf, ApiError> {
        let mut partial = PartialFile::create(target)?;
        let response = self.dispatch(request)?;
        check_download(response.status, &response.body)?;
        partial.write(&response.body)?;
        debug!(path = %partial.path.display(), bytes = response.body.len(), "download saved");
        Ok(partial.keep())
    }
}

fn require_dir(dest_dir: &Path) -> Result<(), ApiError> {
    if dest_dir.as_os_str().is_empty() {
        return Err(ApiError::missing_parameters());
    }
    Ok(())
}

/// Values that end up in a download's file name must not leave `dest_dir`.
fn plain_file_name(value: &str) -> Result<(), ApiError> {
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ApiError::missing_parameters());
    }
    Ok(())
}

fn downloaded(outcome: Result<PathBuf, ApiError>) -> DeepvizResult {
    match outcome {
        Ok(path) => DeepvizResult::success(format!("File downloaded to: {}", path.display())),
        Err(e) => e.into(),
    }
}

/// Destination file of a download. Removed on drop unless `keep` was called.
struct PartialFile {
    path: PathBuf,
    file: Option<File>,
}

impl PartialFile {
    fn create(path: PathBuf) -> Result<Self, ApiError> {
        let file = File::create(&path)
            .map_err(|e| ApiError::Input(format!("Unable to create file: {e}")))?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    fn write(&mut self, content: &[u8]) -> Result<(), ApiError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| ApiError::Internal("Unable to save file".to_string()))?;
        file.write_all(content)
            .and_then(|()| file.flush())
            .map_err(|e| ApiError::Internal(format!("Unable to save file: {e}")))
    }

    fn keep(mut self) -> PathBuf {
        self.file = None;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Only a file still held here is unfinished.
        if self.file.take().is_some() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "could not remove partial download");
            }
        }
    }
}
