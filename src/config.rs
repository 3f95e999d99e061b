use std::env;
use std::time::Duration;

/// Base URL used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Environment variable consulted by [`ClientConfig::from_env`].
pub const BASE_URL_ENV: &str = "DEBATE_API_BASE";

/// Connection settings for the debate backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the session API (e.g. `http://localhost:8000/api/v1`).
    pub base_url: String,
    /// Deadline for ordinary calls (session creation, history fetch).
    pub request_timeout: Duration,
    /// Deadline for calls that run an agent reasoning step on the server.
    pub reasoning_timeout: Duration,
}

impl ClientConfig {
    /// Create a config with default timeouts.
    ///
    /// - request_timeout: 10 s
    /// - reasoning_timeout: 90 s
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            request_timeout: Duration::from_secs(10),
            reasoning_timeout: Duration::from_secs(90),
        }
    }

    /// Read the base URL from `DEBATE_API_BASE`, falling back to the local
    /// default.
    pub fn from_env() -> Self {
        let base = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_default_timeouts() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.reasoning_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let config = ClientConfig::new("http://example.com/api/v1/");
        assert_eq!(config.base_url, "http://example.com/api/v1");
    }

    #[test]
    fn test_multiple_trailing_slashes_stripped() {
        let config = ClientConfig::new("http://example.com///");
        assert_eq!(config.base_url, "http://example.com");
    }

    #[test]
    fn test_custom_base_url_kept() {
        let config = ClientConfig::new("https://debate.example.org/api/v1");
        assert_eq!(config.base_url, "https://debate.example.org/api/v1");
    }
}
