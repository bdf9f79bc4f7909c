//! Verify the normalizer and the `build_*` methods against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Request bodies are compared as parsed JSON, so only keys and values
//! matter, not their order.

use deepviz_core::{normalize, BoundedList, ClientConfig, DeepvizClient, HttpRequest, ResultStatus};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> DeepvizClient {
    DeepvizClient::from_config(&ClientConfig::default().with_base_url(BASE_URL))
}

fn parse_status(s: &str) -> ResultStatus {
    match s {
        "Success" => ResultStatus::Success,
        "InputError" => ResultStatus::InputError,
        "NetworkError" => ResultStatus::NetworkError,
        "ClientError" => ResultStatus::ClientError,
        "ServerError" => ResultStatus::ServerError,
        "InternalError" => ResultStatus::InternalError,
        "Processing" => ResultStatus::Processing,
        other => panic!("unknown status: {other}"),
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args[key].as_str().unwrap_or_default()
}

fn list_arg(args: &Value, key: &str) -> Option<BoundedList> {
    let entries = args.get(key)?.as_array()?;
    let mut list = BoundedList::new(entries.len().max(1)).unwrap();
    for entry in entries {
        list.add(entry.as_str().unwrap()).unwrap();
    }
    Some(list)
}

fn build(c: &DeepvizClient, operation: &str, args: &Value) -> HttpRequest {
    let api_key = str_arg(args, "api_key");
    let history = args["history"].as_bool().unwrap_or(false);
    let time_delta = args["time_delta"].as_str();
    let filters = list_arg(args, "filters");
    let result = match operation {
        "sample_report" => c.build_sample_report(str_arg(args, "md5"), api_key, filters.as_ref()),
        "sample_download" => c.build_sample_download(str_arg(args, "md5"), api_key),
        "bulk_download_request" => {
            c.build_bulk_download_request(list_arg(args, "hashes").as_ref(), api_key)
        }
        "bulk_download_retrieve" => {
            c.build_bulk_download_retrieve(str_arg(args, "id_request"), api_key)
        }
        "ip_info" => c.build_ip_info(api_key, list_arg(args, "ips").as_ref(), time_delta, history),
        "domain_info" => c.build_domain_info(
            api_key,
            list_arg(args, "domains").as_ref(),
            time_delta,
            history,
            filters.as_ref(),
        ),
        "search" => c.build_search(
            api_key,
            str_arg(args, "query"),
            args["start"].as_i64().unwrap() as i32,
            args["rows"].as_i64().unwrap() as i32,
        ),
        other => panic!("unknown operation: {other}"),
    };
    result.unwrap()
}

#[test]
fn normalize_test_vectors() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let body = case["body"].as_str().unwrap();
        let expected = &case["expected"];

        let result = normalize(status, body.as_bytes());
        assert_eq!(
            result.status,
            parse_status(expected["status"].as_str().unwrap()),
            "{name}: status"
        );
        assert_eq!(result.message, expected["message"].as_str().unwrap(), "{name}: message");
    }
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected"];

        let req = build(&c, case["operation"].as_str().unwrap(), &case["args"]);
        assert_eq!(
            req.url,
            format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
            "{name}: url"
        );
        let body: Value = serde_json::from_str(req.json().unwrap()).unwrap();
        assert_eq!(body, expected["body"], "{name}: body");
    }
}
