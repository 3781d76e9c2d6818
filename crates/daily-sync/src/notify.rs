//! Pre-start reminders.
//!
//! On each tick the [`NotificationProcessor`] looks at the day's events and
//! sends one reminder per upcoming notifiable event that starts within the
//! lead time. A reminder time that fell between two ticks is still honoured
//! on the later tick, even if the event has started by then. Delivery marks
//! the event notified through the [`EventSource`], so later ticks and later
//! syncs stay quiet.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use daily_core::{Event, EventState, NotificationText, notification_text};
use notify_rust::Notification;
#[cfg(target_os = "linux")]
use notify_rust::Urgency;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::source::EventSource;

/// Default reminder lead time in minutes.
pub const DEFAULT_LEAD_MINUTES: u64 = 1;

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Remind when an event starts within this many minutes.
    pub lead_minutes: u64,
    pub app_name: String,
    pub timeout: Duration,
    pub enabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            lead_minutes: DEFAULT_LEAD_MINUTES,
            app_name: "daily".to_string(),
            timeout: Duration::from_secs(10),
            enabled: true,
        }
    }
}

impl NotifyConfig {
    pub fn new(lead_minutes: u64) -> Self {
        Self {
            lead_minutes,
            ..Default::default()
        }
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Error)]
#[error("failed to deliver notification: {0}")]
pub struct NotifyError(String);

impl NotifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Delivers a reminder to the user.
pub trait Notifier: Send + Sync {
    fn send(&self, text: &NotificationText) -> Result<(), NotifyError>;
}

/// Desktop notifications through the platform notification service.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
    timeout: Duration,
}

impl DesktopNotifier {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            timeout: config.timeout,
        }
    }
}

impl Notifier for DesktopNotifier {
    fn send(&self, text: &NotificationText) -> Result<(), NotifyError> {
        let body = match &text.link {
            Some(link) => format!("{}\n{}", text.body, link),
            None => text.body.clone(),
        };

        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(&text.title)
            .body(&body)
            .timeout(self.timeout);

        #[cfg(target_os = "linux")]
        notification.urgency(Urgency::Critical);

        notification
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::new(e.to_string()))
    }
}

/// Sends reminders for events about to start.
pub struct NotificationProcessor<N> {
    config: NotifyConfig,
    notifier: N,
    /// Time of the previous [`NotificationProcessor::process`] call.
    last_run: Mutex<Option<DateTime<Utc>>>,
}

impl<N: Notifier> NotificationProcessor<N> {
    pub fn new(config: NotifyConfig, notifier: N) -> Self {
        Self {
            config,
            notifier,
            last_run: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Returns true if `event` is due for a reminder at `now`.
    ///
    /// `since` is the previous check. An event that started after its
    /// reminder time passed `since` is still due.
    pub fn is_due(&self, event: &Event, now: DateTime<Utc>, since: Option<DateTime<Utc>>) -> bool {
        let lead = chrono::Duration::minutes(self.config.lead_minutes.min(i64::MAX as u64) as i64);
        let remind_at = event.start() - lead;
        match event.state_at(now) {
            EventState::Upcoming => remind_at <= now,
            EventState::Started => since.is_some_and(|since| remind_at > since),
            EventState::Finished => false,
        }
    }

    /// Sends reminders for due events and marks them notified.
    ///
    /// Returns how many reminders were delivered. A failed delivery leaves
    /// the event armed for the next tick.
    pub async fn process<S>(&self, events: &[Event], source: &S, now: DateTime<Utc>) -> usize
    where
        S: EventSource + ?Sized,
    {
        let since = self
            .last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(now);
        if !self.config.enabled {
            return 0;
        }

        let mut sent = 0;
        for event in events.iter().filter(|e| self.is_due(e, now, since)) {
            if !event.is_notifiable() {
                debug!(title = %event.title(), "not notifying, event is not notifiable");
                continue;
            }

            let text = notification_text(event, event.start() - now);
            match self.notifier.send(&text) {
                Ok(()) => {
                    info!(title = %event.title(), "reminder sent");
                    source.mark_notified(event.id()).await;
                    sent += 1;
                }
                Err(e) => warn!(error = %e, title = %event.title(), "reminder failed"),
            }
        }
        sent
    }
}
