//! Request payloads for the Deepviz API.
//!
//! # Design
//! Payloads are pass-through key/value data: each struct only fixes which
//! keys an endpoint receives and when they are omitted. Two wire quirks are
//! encoded here: flags travel as the strings `"true"` / `"false"`, and
//! pagination travels as `["start=<n>", "rows=<n>"]`.

use serde::{Deserialize, Serialize, Serializer};

use crate::list::BoundedList;

/// Pagination window encoded as two formatted strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSet {
    pub start: i32,
    pub rows: i32,
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [format!("start={}", self.start), format!("rows={}", self.rows)].serialize(serializer)
    }
}

fn flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "true" } else { "false" })
}

/// `general/report`
#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest {
    pub api_key: String,
    pub md5: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_filters: Option<Vec<String>>,
}

/// `sandbox/sample`
#[derive(Debug, Clone, Serialize)]
pub struct SampleRequest {
    pub api_key: String,
    pub md5: String,
}

/// `sandbox/sample/bulk/request`
#[derive(Debug, Clone, Serialize)]
pub struct BulkRequest {
    pub api_key: String,
    pub hashes: Vec<String>,
}

/// `sandbox/sample/bulk/retrieve`
#[derive(Debug, Clone, Serialize)]
pub struct BulkRetrieveRequest {
    pub api_key: String,
    pub id_request: String,
}

/// The `data` object of a successful bulk request.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkTicket {
    pub id_request: i64,
}

/// `intel/network/ip`
#[derive(Debug, Clone, Serialize)]
pub struct IpInfoRequest {
    pub api_key: String,
    #[serde(serialize_with = "flag")]
    pub history: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_delta: Option<String>,
}

/// `intel/network/domain`
#[derive(Debug, Clone, Serialize)]
pub struct DomainInfoRequest {
    pub api_key: String,
    #[serde(serialize_with = "flag")]
    pub history: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_delta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_filters: Option<Vec<String>>,
}

/// `intel/search`
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub api_key: String,
    pub string: String,
    pub result_set: ResultSet,
}

/// `intel/search/advanced`
#[derive(Debug, Clone, Serialize)]
pub struct AdvancedSearchRequest {
    pub api_key: String,
    pub result_set: ResultSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sim_hash: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imp_hash: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(serialize_with = "flag")]
    pub never_seen: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_delta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_range: Option<String>,
}

/// Optional filters of an advanced search. Every list is sent only when it
/// holds at least one entry, every scalar only when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvancedSearch<'a> {
    pub sim_hash: Option<&'a BoundedList>,
    pub created_files: Option<&'a BoundedList>,
    pub imp_hash: Option<&'a BoundedList>,
    pub url: Option<&'a BoundedList>,
    pub strings: Option<&'a BoundedList>,
    pub ip: Option<&'a BoundedList>,
    pub asn: Option<&'a BoundedList>,
    pub classification: Option<&'a str>,
    pub rules: Option<&'a BoundedList>,
    pub country: Option<&'a BoundedList>,
    pub never_seen: bool,
    pub time_delta: Option<&'a str>,
    pub ip_range: Option<&'a str>,
    pub domain: Option<&'a BoundedList>,
}
