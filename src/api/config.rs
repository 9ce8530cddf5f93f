//! Configuration for the backend client.

use std::time::Duration;

use url::Url;

/// Default backend base URL (local development server).
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

/// Configuration for [`HttpBackend`](super::HttpBackend).
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base URL all endpoint paths are resolved against.
    pub base_url: String,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl BackendConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// # Errors
    /// Returns an error if the base URL or the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_resolution() {
        let config = BackendConfig::default();
        let url = config.endpoint("api/slots").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/api/slots");
    }

    #[test]
    fn test_builder_overrides() {
        let config = BackendConfig::new()
            .with_base_url("https://booking.example.com/")
            .with_request_timeout(Duration::from_secs(5));
        let url = config.endpoint("chat").unwrap();
        assert_eq!(url.as_str(), "https://booking.example.com/chat");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
