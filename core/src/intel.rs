//! Threat-intelligence operations: IP and domain lookups, searches.

use crate::client::{ensure_platform, present, require, DeepvizClient};
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::list::{populated, BoundedList};
use crate::result::DeepvizResult;
use crate::transport::Transport;
use crate::types::{
    AdvancedSearch, AdvancedSearchRequest, DomainInfoRequest, IpInfoRequest, ResultSet,
    SearchRequest,
};

pub const IP_INFO_PATH: &str = "intel/network/ip";
pub const DOMAIN_INFO_PATH: &str = "intel/network/domain";
pub const SEARCH_PATH: &str = "intel/search";
pub const ADVANCED_SEARCH_PATH: &str = "intel/search/advanced";

const IPS_OR_TIMESTAMP: &str = "You must specify either a list of IPs or timestamp. Please try again!";
const NO_IPS: &str = "You must provide one or more IPs. Please try again!";
const DOMAINS_OR_TIMESTAMP: &str =
    "You must specify either a list of domains or timestamp. Please try again!";
const NO_DOMAINS: &str = "You must provide one or more domains. Please try again!";
const NO_FILTERS: &str = "You must provide one or more output filters in a list. Please try again!";

/// What a network lookup targets: explicit entries or a time window.
enum Selector {
    Entries(Vec<String>),
    TimeDelta(String),
}

/// Exactly one of `list` and `time_delta` must be given.
fn selector(
    list: Option<&BoundedList>,
    time_delta: Option<&str>,
    both: &str,
    empty: &str,
) -> Result<Selector, ApiError> {
    match (list, present(time_delta)) {
        (None, None) => Err(ApiError::missing_parameters()),
        (Some(_), Some(_)) => Err(ApiError::Input(both.to_string())),
        (Some(list), None) => populated(Some(list))
            .map(Selector::Entries)
            .ok_or_else(|| ApiError::Input(empty.to_string())),
        (None, Some(time_delta)) => Ok(Selector::TimeDelta(time_delta.to_string())),
    }
}

impl Selector {
    fn split(self) -> (Option<Vec<String>>, Option<String>) {
        match self {
            Selector::Entries(entries) => (Some(entries), None),
            Selector::TimeDelta(time_delta) => (None, Some(time_delta)),
        }
    }
}

impl<T: Transport> DeepvizClient<T> {
    pub fn build_ip_info(
        &self,
        api_key: &str,
        ip_list: Option<&BoundedList>,
        time_delta: Option<&str>,
        history: bool,
    ) -> Result<HttpRequest, ApiError> {
        require(&[api_key])?;
        let (ip, time_delta) = selector(ip_list, time_delta, IPS_OR_TIMESTAMP, NO_IPS)?.split();
        self.json_request(
            IP_INFO_PATH,
            &IpInfoRequest {
                api_key: api_key.to_string(),
                history,
                ip,
                time_delta,
            },
        )
    }

    /// Intelligence on a list of IPs, or on every IP seen within
    /// `time_delta` (for example `"3d"`).
    pub fn ip_info(
        &self,
        api_key: &str,
        ip_list: Option<&BoundedList>,
        time_delta: Option<&str>,
        history: bool,
    ) -> DeepvizResult {
        self.execute(
            ensure_platform().and_then(|()| self.build_ip_info(api_key, ip_list, time_delta, history)),
        )
    }

    pub fn build_domain_info(
        &self,
        api_key: &str,
        domain_list: Option<&BoundedList>,
        time_delta: Option<&str>,
        history: bool,
        filters: Option<&BoundedList>,
    ) -> Result<HttpRequest, ApiError> {
        require(&[api_key])?;
        if domain_list.is_none() && present(time_delta).is_none() {
            return Err(ApiError::missing_parameters());
        }
        if domain_list.is_some() && present(time_delta).is_some() {
            return Err(ApiError::Input(DOMAINS_OR_TIMESTAMP.to_string()));
        }
        let output_filters = match filters {
            Some(list) => Some(populated(Some(list)).ok_or_else(|| ApiError::Input(NO_FILTERS.to_string()))?),
            None => None,
        };
        let (domain, time_delta) =
            selector(domain_list, time_delta, DOMAINS_OR_TIMESTAMP, NO_DOMAINS)?.split();
        self.json_request(
            DOMAIN_INFO_PATH,
            &DomainInfoRequest {
                api_key: api_key.to_string(),
                history,
                domain,
                time_delta,
                output_filters,
            },
        )
    }

    /// Intelligence on a list of domains, or on every domain seen within
    /// `time_delta`, restricted to `filters` when given.
    pub fn domain_info(
        &self,
        api_key: &str,
        domain_list: Option<&BoundedList>,
        time_delta: Option<&str>,
        history: bool,
        filters: Option<&BoundedList>,
    ) -> DeepvizResult {
        self.execute(ensure_platform().and_then(|()| {
            self.build_domain_info(api_key, domain_list, time_delta, history, filters)
        }))
    }

    pub fn build_search(
        &self,
        api_key: &str,
        query: &str,
        start_offset: i32,
        elements: i32,
    ) -> Result<HttpRequest, ApiError> {
        require(&[api_key, query])?;
        self.json_request(
            SEARCH_PATH,
            &SearchRequest {
                api_key: api_key.to_string(),
                string: query.to_string(),
                result_set: ResultSet {
                    start: start_offset,
                    rows: elements,
                },
            },
        )
    }

    /// Full-text search over the intelligence database.
    pub fn search(&self, api_key: &str, query: &str, start_offset: i32, elements: i32) -> DeepvizResult {
        self.execute(
            ensure_platform().and_then(|()| self.build_search(api_key, query, start_offset, elements)),
        )
    }

    pub fn build_advanced_search(
        &self,
        api_key: &str,
        filters: &AdvancedSearch<'_>,
        start_offset: i32,
        elements: i32,
    ) -> Result<HttpRequest, ApiError> {
        require(&[api_key])?;
        let owned = |value: Option<&str>| present(value).map(str::to_string);
        self.json_request(
            ADVANCED_SEARCH_PATH,
            &AdvancedSearchRequest {
                api_key: api_key.to_string(),
                result_set: ResultSet {
                    start: start_offset,
                    rows: elements,
                },
                sim_hash: populated(filters.sim_hash),
                created_files: populated(filters.created_files),
                imp_hash: populated(filters.imp_hash),
                url: populated(filters.url),
                strings: populated(filters.strings),
                ip: populated(filters.ip),
                asn: populated(filters.asn),
                rules: populated(filters.rules),
                country: populated(filters.country),
                domain: populated(filters.domain),
                classification: owned(filters.classification),
                never_seen: filters.never_seen,
                time_delta: owned(filters.time_delta),
                ip_range: owned(filters.ip_range),
            },
        )
    }

    /// Search combining any of the `AdvancedSearch` filters.
    pub fn advanced_search(
        &self,
        api_key: &str,
        filters: &AdvancedSearch<'_>,
        start_offset: i32,
        elements: i32,
    ) -> DeepvizResult {
        self.execute(ensure_platform().and_then(|()| {
            self.build_advanced_search(api_key, filters, start_offset, elements)
        }))
    }
}
