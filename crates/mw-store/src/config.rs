//! Store connection settings.

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Environment variable that overrides the base URL.
pub const API_URL_ENV: &str = "MAPWRIGHT_API_URL";

/// Configuration for the HTTP map store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the REST service, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Set the base URL. Trailing slashes are dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout (at least one second).
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    /// Full URL for a path below the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
