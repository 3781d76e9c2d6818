//! Google Calendar client configuration.

use std::time::Duration;

/// Base URL for Google Calendar API v3.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar listed when none is configured.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// API root, without trailing slash. Tests point this at a mock server.
    pub api_base: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Page size requested per call.
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            page_size: 250,
            user_agent: format!("daily/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GoogleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GoogleConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.page_size, 250);
        assert!(config.user_agent.starts_with("daily/"));
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let config = GoogleConfig::new()
            .with_api_base("http://127.0.0.1:8080/")
            .with_timeout(Duration::from_secs(5))
            .with_page_size(0);
        assert_eq!(config.api_base, "http://127.0.0.1:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.page_size, 1);
    }
}
