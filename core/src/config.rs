//! Client configuration.

use std::time::Duration;

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.deepviz.com";

/// Environment variable that overrides the base URL.
pub const BASE_URL_ENV: &str = "DEEPVIZ_BASE_URL";

/// Analyses can keep a request open for a long time.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Identifier sent as the multipart `source` field.
pub const CLIENT_SOURCE: &str = "c_deepviz";

const USER_AGENT: &str = concat!("c-deepviz/", env!("CARGO_PKG_VERSION"));

/// Settings for a `DeepvizClient` and its `UreqTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to both the response head and the body.
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL taken from `DEEPVIZ_BASE_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}
