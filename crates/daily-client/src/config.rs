//! Client configuration.
//!
//! Static tuning lives in `~/.config/daily/config.toml`. Values the user
//! changes day to day (calendar id, lead time, Mattermost server) are
//! preferences, edited with `daily config set` and stored next to it in
//! `preferences.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use daily_sync::{NotifyConfig, SchedulerConfig, SyncConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub debug: bool,
    pub calendar: CalendarSettings,
    pub notifications: NotificationSettings,
    pub mattermost: MattermostSettings,
    pub watch: WatchSettings,
}

/// Sync window and request tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Days fetched on each side of the displayed day.
    pub half_window_days: u64,
    /// Days from a window edge that trigger a recentre.
    pub min_buffer_threshold: i64,
    pub request_timeout_secs: u64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            half_window_days: sync.half_window_days,
            min_buffer_threshold: sync.min_buffer_threshold,
            request_timeout_secs: sync.request_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    /// How long a reminder stays on screen.
    pub timeout_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MattermostSettings {
    /// Set the meeting status while `daily watch` runs.
    pub enabled: bool,
}

impl Default for MattermostSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub tick_secs: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self { tick_secs: 60 }
    }
}

impl ClientConfig {
    /// Loads the default file, or defaults if it does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daily")
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn preferences_path() -> PathBuf {
        Self::default_config_dir().join("preferences.toml")
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> ClientResult<()> {
        if self.calendar.half_window_days == 0 {
            return Err(ClientError::Config(
                "calendar.half_window_days must be at least 1".to_string(),
            ));
        }
        if self.calendar.min_buffer_threshold < 0
            || self.calendar.min_buffer_threshold as u64 > self.calendar.half_window_days
        {
            return Err(ClientError::Config(
                "calendar.min_buffer_threshold must be between 0 and half_window_days"
                    .to_string(),
            ));
        }
        if self.watch.tick_secs == 0 {
            return Err(ClientError::Config(
                "watch.tick_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new()
            .with_half_window_days(self.calendar.half_window_days)
            .with_min_buffer_threshold(self.calendar.min_buffer_threshold)
            .with_request_timeout(Duration::from_secs(self.calendar.request_timeout_secs))
    }

    pub fn notify_config(&self, lead_minutes: u64) -> NotifyConfig {
        NotifyConfig::new(lead_minutes)
            .with_enabled(self.notifications.enabled)
            .with_timeout(Duration::from_secs(self.notifications.timeout_secs))
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_secs(self.watch.tick_secs))
    }
}
