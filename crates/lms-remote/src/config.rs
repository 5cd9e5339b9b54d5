//! HTTP client configuration

use serde::{Deserialize, Serialize};

/// Default backend root used for local development
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Connection settings for [`HttpResourceClient`](crate::HttpResourceClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `https://admin.example.com/api`
    pub base_url: String,
    /// Bearer token attached to every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Whole-request timeout in seconds (0 disables it)
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API root
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Join `path` onto the base URL, tolerating a trailing slash
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ClientConfig::new().with_base_url("http://host/api/");
        assert_eq!(config.endpoint("/courses/5"), "http://host/api/courses/5");
        assert_eq!(config.endpoint("courses"), "http://host/api/courses");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"api_token": "t"}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.api_token.as_deref(), Some("t"));
    }
}
