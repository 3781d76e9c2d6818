//! Sync engine configuration.

use std::time::Duration;

use daily_providers::google::DEFAULT_CALENDAR_ID;

/// Days fetched on each side of the requested day.
pub const DEFAULT_HALF_WINDOW_DAYS: u64 = 5;

/// A day this close to a window edge triggers a recentre.
pub const DEFAULT_MIN_BUFFER_THRESHOLD: i64 = 2;

/// Minutes after which a read forces a refresh.
pub const DEFAULT_UPDATE_INTERVAL_MINUTES: u64 = 5;

/// Tunables for the window tracker, engine and facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub half_window_days: u64,
    pub min_buffer_threshold: i64,
    /// Age of the last successful refresh that forces a new one.
    pub update_interval: Duration,
    /// Timeout for each remote call.
    pub request_timeout: Duration,
    /// Calendar used when the `calendar-id` preference is unset.
    pub default_calendar_id: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            half_window_days: DEFAULT_HALF_WINDOW_DAYS,
            min_buffer_threshold: DEFAULT_MIN_BUFFER_THRESHOLD,
            update_interval: Duration::from_secs(DEFAULT_UPDATE_INTERVAL_MINUTES * 60),
            request_timeout: Duration::from_secs(30),
            default_calendar_id: DEFAULT_CALENDAR_ID.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_half_window_days(mut self, days: u64) -> Self {
        self.half_window_days = days;
        self
    }

    pub fn with_min_buffer_threshold(mut self, days: i64) -> Self {
        self.min_buffer_threshold = days;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_default_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.default_calendar_id = id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.half_window_days, 5);
        assert_eq!(config.min_buffer_threshold, 2);
        assert_eq!(config.update_interval, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.default_calendar_id, "primary");
    }

    #[test]
    fn builder() {
        let config = SyncConfig::new()
            .with_half_window_days(7)
            .with_min_buffer_threshold(3)
            .with_update_interval(Duration::from_secs(60))
            .with_request_timeout(Duration::from_secs(5))
            .with_default_calendar_id("team@example.com");
        assert_eq!(config.half_window_days, 7);
        assert_eq!(config.min_buffer_threshold, 3);
        assert_eq!(config.update_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.default_calendar_id, "team@example.com");
    }
}
