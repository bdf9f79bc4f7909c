//! Synchronous client core for the Deepviz malware-analysis and
//! threat-intelligence API.
//!
//! # Overview
//! Every operation validates its arguments, builds a JSON (or multipart)
//! POST, sends it through a `Transport` and folds the answer into a
//! `DeepvizResult`. Requests can also be built without sending them through
//! the `build_*` methods.
//!
//! # Design
//! - `DeepvizClient` holds only a base URL and a transport; it is `Send + Sync`
//!   whenever the transport is.
//! - Responses are normalized in one place (`normalize`), so every endpoint
//!   reports 428 as `Processing` and error envelopes the same way.
//! - Lists of hashes, IPs, domains and filters are passed as `BoundedList`,
//!   mirroring the fixed-capacity lists of the C interface.
//! - The library never installs a `tracing` subscriber.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod intel;
pub mod list;
pub mod normalize;
pub mod result;
pub mod sandbox;
pub mod transport;
pub mod types;

#[cfg(test)]
mod fake;

pub use client::DeepvizClient;
pub use config::ClientConfig;
pub use error::{ApiError, ListError, TransportError};
pub use http::{HttpRequest, HttpResponse, MultipartForm, RequestBody};
pub use list::BoundedList;
pub use normalize::{check_download, normalize};
pub use result::{DeepvizResult, ResultStatus};
pub use transport::{Transport, UreqTransport};
pub use types::AdvancedSearch;
