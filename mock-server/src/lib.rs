//! In-memory imitation of the Deepviz REST API.
//!
//! Every endpoint is a POST. JSON endpoints answer with the `{"data": ...}`
//! or `{"errmsg": ...}` envelope, downloads answer with raw bytes. A few
//! fixed values steer the responses: `API_KEY` is the only accepted key,
//! `KNOWN_MD5` has a finished report and a downloadable sample,
//! `PENDING_MD5` is still being analyzed, and searching for `CRASH_QUERY`
//! fails with a 500.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const API_KEY: &str = "0123456789abcdef0123456789abcdef";
pub const KNOWN_MD5: &str = "a6ca3b8c79e1b7e2a6ef046b0702aeb2";
pub const PENDING_MD5: &str = "44d88612fea8a8f36de82e1278abb02f";
pub const CRASH_QUERY: &str = "crash";

/// Body of every successful sample download.
pub const SAMPLE_BYTES: &[u8] = b"MZ\x90\x00\x03\x00\x00\x00deepviz mock sample";

/// Body of every successful bulk archive download.
pub const ARCHIVE_BYTES: &[u8] = b"PK\x03\x04\x14\x00\x00\x00deepviz mock archive";

const UPLOAD_LIMIT: usize = 64 * 1024 * 1024;

/// A file received on `sandbox/submit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub file_name: String,
    pub source: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct Registry {
    pub submissions: Vec<Submission>,
    pub bulk_requests: HashMap<i64, Vec<String>>,
    next_id: i64,
}

pub type Db = Arc<RwLock<Registry>>;

pub fn app() -> Router {
    router(Db::default())
}

/// Router over a caller-owned registry, so tests can inspect what was
/// received.
pub fn router(db: Db) -> Router {
    Router::new()
        .route("/general/report", post(report))
        .route("/sandbox/submit", post(submit))
        .route("/sandbox/sample", post(sample))
        .route("/sandbox/sample/bulk/request", post(bulk_request))
        .route("/sandbox/sample/bulk/retrieve", post(bulk_retrieve))
        .route("/intel/network/ip", post(echo))
        .route("/intel/network/domain", post(echo))
        .route("/intel/search", post(search))
        .route("/intel/search/advanced", post(echo))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn errmsg(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "errmsg": message }))).into_response()
}

fn data(value: Value) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn binary(content: &'static [u8]) -> Response {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Bytes::from_static(content),
    )
        .into_response()
}

fn authorize(api_key: Option<&str>) -> Result<(), Response> {
    match api_key {
        Some(API_KEY) => Ok(()),
        Some(_) => Err(errmsg(StatusCode::UNAUTHORIZED, "Invalid API key")),
        None => Err(errmsg(StatusCode::BAD_REQUEST, "Missing api_key")),
    }
}

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

/// Lookup of a sample's analysis state by MD5.
fn sample_state(md5: Option<&str>) -> Result<(), Response> {
    match md5 {
        Some(KNOWN_MD5) => Ok(()),
        Some(PENDING_MD5) => Err(errmsg(
            StatusCode::PRECONDITION_REQUIRED,
            "Analysis is running",
        )),
        Some(_) => Err(errmsg(StatusCode::NOT_FOUND, "Sample not found")),
        None => Err(errmsg(StatusCode::BAD_REQUEST, "Missing md5")),
    }
}

fn full_report() -> Value {
    json!({
        "classification": { "result": "malicious", "accuracy": 98 },
        "rules": ["packer_upx", "injects_into_process"],
        "network_ip": ["185.141.25.61"],
        "hash": { "md5": KNOWN_MD5 },
    })
}

async fn report(Json(payload): Json<Value>) -> Response {
    if let Err(response) = authorize(str_field(&payload, "api_key"))
        .and_then(|()| sample_state(str_field(&payload, "md5")))
    {
        return response;
    }

    let report = full_report();
    let Some(filters) = payload.get("output_filters").and_then(Value::as_array) else {
        return data(report);
    };
    let mut filtered = serde_json::Map::new();
    for name in filters.iter().filter_map(Value::as_str) {
        if let Some(section) = report.get(name) {
            filtered.insert(name.to_string(), section.clone());
        }
    }
    data(Value::Object(filtered))
}

async fn submit(State(db): State<Db>, mut multipart: Multipart) -> Response {
    let mut api_key = None;
    let mut source = String::new();
    let mut file = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return errmsg(StatusCode::BAD_REQUEST, &e.body_text()),
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content = match field.bytes().await {
            Ok(content) => content,
            Err(e) => return errmsg(StatusCode::BAD_REQUEST, &e.body_text()),
        };
        match name.as_str() {
            "api_key" => api_key = Some(String::from_utf8_lossy(&content).into_owned()),
            "source" => source = String::from_utf8_lossy(&content).into_owned(),
            "file" => file = Some((file_name.unwrap_or_default(), content.len())),
            _ => {}
        }
    }

    if let Err(response) = authorize(api_key.as_deref()) {
        return response;
    }
    let Some((file_name, size)) = file else {
        return errmsg(StatusCode::BAD_REQUEST, "Missing file");
    };
    if size == 0 {
        return errmsg(StatusCode::BAD_REQUEST, "Empty file");
    }

    info!(%file_name, size, %source, "sample submitted");
    db.write().await.submissions.push(Submission {
        file_name,
        source,
        size,
    });
    data(json!("Submission successful"))
}

async fn sample(Json(payload): Json<Value>) -> Response {
    match authorize(str_field(&payload, "api_key"))
        .and_then(|()| sample_state(str_field(&payload, "md5")))
    {
        Ok(()) => binary(SAMPLE_BYTES),
        Err(response) => response,
    }
}

async fn bulk_request(State(db): State<Db>, Json(payload): Json<Value>) -> Response {
    if let Err(response) = authorize(str_field(&payload, "api_key")) {
        return response;
    }
    let hashes: Vec<String> = payload
        .get("hashes")
        .and_then(Value::as_array)
        .map(|hashes| {
            hashes
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if hashes.is_empty() {
        return errmsg(StatusCode::BAD_REQUEST, "No hashes provided");
    }

    let mut registry = db.write().await;
    registry.next_id += 1;
    let id = registry.next_id;
    debug!(id, count = hashes.len(), "bulk request queued");
    registry.bulk_requests.insert(id, hashes);
    data(json!({ "id_request": id }))
}

async fn bulk_retrieve(State(db): State<Db>, Json(payload): Json<Value>) -> Response {
    if let Err(response) = authorize(str_field(&payload, "api_key")) {
        return response;
    }
    let id = str_field(&payload, "id_request").and_then(|id| id.parse::<i64>().ok());
    let Some(id) = id else {
        return errmsg(StatusCode::BAD_REQUEST, "Invalid id_request");
    };
    if db.read().await.bulk_requests.contains_key(&id) {
        binary(ARCHIVE_BYTES)
    } else {
        errmsg(StatusCode::NOT_FOUND, "Bulk request not found")
    }
}

async fn search(Json(payload): Json<Value>) -> Response {
    if str_field(&payload, "string") == Some(CRASH_QUERY) {
        return errmsg(StatusCode::INTERNAL_SERVER_ERROR, "Search backend unavailable");
    }
    echo(Json(payload)).await
}

/// Intelligence endpoints answer with the query they received, minus the key.
async fn echo(Json(mut payload): Json<Value>) -> Response {
    if let Err(response) = authorize(str_field(&payload, "api_key")) {
        return response;
    }
    if let Some(object) = payload.as_object_mut() {
        object.remove("api_key");
    }
    data(json!({ "query": payload }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_accepts_only_the_mock_key() {
        assert!(authorize(Some(API_KEY)).is_ok());
        assert_eq!(
            authorize(Some("wrong")).unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(authorize(None).unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sample_states() {
        assert!(sample_state(Some(KNOWN_MD5)).is_ok());
        assert_eq!(
            sample_state(Some(PENDING_MD5)).unwrap_err().status(),
            StatusCode::PRECONDITION_REQUIRED
        );
        assert_eq!(
            sample_state(Some("ffffffffffffffffffffffffffffffff")).unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn report_sections_are_objects_or_arrays() {
        let report = full_report();
        assert!(report["classification"].is_object());
        assert!(report["rules"].is_array());
    }

    #[test]
    fn submission_serializes() {
        let submission = Submission {
            file_name: "a.exe".into(),
            source: "c_deepviz".into(),
            size: 3,
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["file_name"], "a.exe");
        assert_eq!(json["size"], 3);
    }
}
