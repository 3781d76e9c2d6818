//! Meeting status driver.
//!
//! While the user is in a meeting the driver asks a [`StatusSink`] to show
//! it. Each meeting is applied once; a meeting the sink skipped because the
//! user already set a status is not retried.

use std::time::Duration;

use chrono::{DateTime, Utc};
use daily_core::{Event, ResponseStatus};
use daily_providers::mattermost::{MattermostClient, StatusUpdate};
use daily_providers::{BoxFuture, ProviderResult};
use tracing::{debug, info};

use crate::error::SyncResult;
use crate::store::{Preferences, SecretStore, keys};

/// Something that can show the user as in a meeting.
pub trait StatusSink: Send + Sync {
    fn apply_meeting<'a>(
        &'a self,
        title: &'a str,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, ProviderResult<StatusUpdate>>;
}

impl StatusSink for MattermostClient {
    fn apply_meeting<'a>(
        &'a self,
        title: &'a str,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, ProviderResult<StatusUpdate>> {
        Box::pin(self.update_for_meeting(title, end, now))
    }
}

/// The ongoing meeting the user has not declined, if any.
pub fn current_meeting(events: &[Event], now: DateTime<Utc>) -> Option<&Event> {
    events
        .iter()
        .find(|e| e.is_started_at(now) && e.response() != ResponseStatus::Declined)
}

pub struct MeetingStatusDriver<S> {
    sink: S,
    last_applied: Option<String>,
}

impl MeetingStatusDriver<MattermostClient> {
    /// Builds a Mattermost driver from stored settings.
    ///
    /// Returns `Ok(None)` when no server or no token is configured.
    pub fn from_stores<S, P>(secrets: &S, prefs: &P, timeout: Duration) -> SyncResult<Option<Self>>
    where
        S: SecretStore + ?Sized,
        P: Preferences + ?Sized,
    {
        let server = prefs
            .get_string(keys::MATTERMOST_SERVER)?
            .filter(|s| !s.trim().is_empty());
        let token = secrets
            .get(keys::MATTERMOST_TOKEN)?
            .filter(|t| !t.trim().is_empty());

        let (Some(server), Some(token)) = (server, token) else {
            debug!("mattermost not configured");
            return Ok(None);
        };

        let client = MattermostClient::new(&server, token.trim(), timeout)?;
        info!(server = %client.server_url(), "mattermost status updates enabled");
        Ok(Some(Self::new(client)))
    }
}

impl<S: StatusSink> MeetingStatusDriver<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            last_applied: None,
        }
    }

    /// Applies the ongoing meeting in `events`, once per meeting.
    ///
    /// Returns `None` when there was nothing new to apply. A failed call is
    /// retried on the next update.
    pub async fn update(
        &mut self,
        events: &[Event],
        now: DateTime<Utc>,
    ) -> ProviderResult<Option<StatusUpdate>> {
        let Some(meeting) = current_meeting(events, now) else {
            self.last_applied = None;
            return Ok(None);
        };
        if self.last_applied.as_deref() == Some(meeting.id()) {
            return Ok(None);
        }

        let outcome = self
            .sink
            .apply_meeting(meeting.title(), meeting.end(), now)
            .await?;
        debug!(title = %meeting.title(), ?outcome, "meeting status applied");
        self.last_applied = Some(meeting.id().to_string());
        Ok(Some(outcome))
    }
}
