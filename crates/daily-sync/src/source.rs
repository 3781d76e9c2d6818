//! Event source facade.
//!
//! [`EventSource`] is what the rest of the application reads the agenda
//! through. Two implementations exist: [`GoogleEventSource`], backed by the
//! sync engine, and [`crate::FixtureEventSource`], serving canned data.

use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeZone};
use daily_core::Event;
use daily_providers::google::{GoogleCalendarClient, GoogleConfig, access_token_from_credential};
use daily_providers::{BoxFuture, CalendarQuery};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::store::{Preferences, SecretStore, keys};

/// Read access to the agenda.
pub trait EventSource: Send + Sync {
    /// Events starting on `day`, ordered by start then title.
    ///
    /// `force` asks for a refresh even if the cache could answer.
    fn day_events(&self, day: NaiveDate, force: bool) -> BoxFuture<'_, SyncResult<Vec<Event>>>;

    /// Records that the reminder for `id` was delivered. Returns false if
    /// the id is unknown.
    fn mark_notified<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool>;
}

impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    fn day_events(&self, day: NaiveDate, force: bool) -> BoxFuture<'_, SyncResult<Vec<Event>>> {
        (**self).day_events(day, force)
    }

    fn mark_notified<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool> {
        (**self).mark_notified(id)
    }
}

/// Agenda backed by Google Calendar.
///
/// Every read runs decision, fetch and commit under one lock, so a poller
/// and a manual refresh never interleave.
pub struct GoogleEventSource<Q = GoogleCalendarClient, Tz = Local> {
    engine: Mutex<SyncEngine<Q, Tz>>,
}

impl GoogleEventSource {
    /// Builds a source for the stored credential and preferences.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Authorization`] if no usable credential is
    /// stored.
    pub fn new<S>(secrets: &S, prefs: Arc<dyn Preferences>, config: SyncConfig) -> SyncResult<Self>
    where
        S: SecretStore + ?Sized,
    {
        let google = GoogleConfig::new().with_timeout(config.request_timeout);
        Self::with_google_config(secrets, prefs, config, google)
    }

    /// Like [`GoogleEventSource::new`] with explicit HTTP settings.
    pub fn with_google_config<S>(
        secrets: &S,
        prefs: Arc<dyn Preferences>,
        config: SyncConfig,
        google: GoogleConfig,
    ) -> SyncResult<Self>
    where
        S: SecretStore + ?Sized,
    {
        let credential = secrets
            .get(keys::CALENDAR_TOKEN)?
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SyncError::authorization("no calendar credential stored"))?;
        let token = access_token_from_credential(&credential)
            .ok_or_else(|| SyncError::authorization("stored calendar credential has no access token"))?;

        let client = GoogleCalendarClient::new(token, google)?;
        Self::with_query(client, prefs, Local, config)
    }
}

impl<Q, Tz> GoogleEventSource<Q, Tz>
where
    Q: CalendarQuery,
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    /// Builds a source over any calendar, resolving the calendar id and
    /// update interval from preferences.
    pub fn with_query(
        query: Q,
        prefs: Arc<dyn Preferences>,
        tz: Tz,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        let config = resolve_config(prefs.as_ref(), config);
        let calendar_id = prefs
            .get_string(keys::CALENDAR_ID)?
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| config.default_calendar_id.clone());
        debug!(%calendar_id, provider = query.name(), "event source ready");

        Ok(Self::from_engine(SyncEngine::new(
            query,
            prefs,
            tz,
            calendar_id,
            &config,
        )))
    }

    pub fn from_engine(engine: SyncEngine<Q, Tz>) -> Self {
        Self {
            engine: Mutex::new(engine),
        }
    }
}

fn resolve_config(prefs: &dyn Preferences, config: SyncConfig) -> SyncConfig {
    let fallback = config.update_interval.as_secs() / 60;
    match prefs.get_u64_or(keys::CALENDAR_UPDATE_INTERVAL, fallback) {
        Ok(minutes) => {
            config.with_update_interval(std::time::Duration::from_secs(minutes.max(1) * 60))
        }
        Err(e) => {
            warn!(error = %e, "ignoring update interval preference");
            config
        }
    }
}

impl<Q, Tz> EventSource for GoogleEventSource<Q, Tz>
where
    Q: CalendarQuery,
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    fn day_events(&self, day: NaiveDate, force: bool) -> BoxFuture<'_, SyncResult<Vec<Event>>> {
        Box::pin(async move { self.engine.lock().await.day_events(day, force).await })
    }

    fn mark_notified<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move { self.engine.lock().await.mark_notified(id) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FakeQuery, manual_clock};
    use crate::store::{MemoryPreferences, MemorySecretStore};
    use chrono::{TimeZone, Utc};
    use daily_providers::{ListResponse, ListScope, RawItem};
    use std::time::Duration;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn missing_credential_is_an_authorization_error() {
        let secrets = MemorySecretStore::new();
        let prefs: Arc<dyn Preferences> = Arc::new(MemoryPreferences::new());
        let err = GoogleEventSource::new(&secrets, prefs, SyncConfig::default())
            .err()
            .unwrap();
        assert!(err.is_authorization());
    }

    #[test]
    fn empty_credential_is_an_authorization_error() {
        let secrets = MemorySecretStore::new().with_secret(keys::CALENDAR_TOKEN, "  ");
        let prefs: Arc<dyn Preferences> = Arc::new(MemoryPreferences::new());
        let err = GoogleEventSource::new(&secrets, prefs, SyncConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, SyncError::Authorization { .. }));
    }

    #[test]
    fn credential_blob_without_token_is_rejected() {
        let secrets = MemorySecretStore::new()
            .with_secret(keys::CALENDAR_TOKEN, r#"{"refresh_token":"r"}"#);
        let prefs: Arc<dyn Preferences> = Arc::new(MemoryPreferences::new());
        assert!(
            GoogleEventSource::new(&secrets, prefs, SyncConfig::default())
                .err()
                .unwrap()
                .is_authorization()
        );
    }

    #[test]
    fn stored_credential_builds_a_source() {
        let secrets = MemorySecretStore::new().with_secret(keys::CALENDAR_TOKEN, "ya29.token");
        let prefs: Arc<dyn Preferences> = Arc::new(MemoryPreferences::new());
        assert!(GoogleEventSource::new(&secrets, prefs, SyncConfig::default()).is_ok());
    }

    #[test]
    fn update_interval_preference_overrides_config() {
        let prefs = MemoryPreferences::new().with_value(keys::CALENDAR_UPDATE_INTERVAL, "15");
        let config = resolve_config(&prefs, SyncConfig::default());
        assert_eq!(config.update_interval, Duration::from_secs(900));

        let prefs = MemoryPreferences::new().with_value(keys::CALENDAR_UPDATE_INTERVAL, "often");
        let config = resolve_config(&prefs, SyncConfig::default());
        assert_eq!(config.update_interval, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn reads_through_the_engine_with_the_preferred_calendar() {
        let query = FakeQuery::new();
        query.push(Ok(ListResponse::with_items(vec![RawItem::timed(
            "1",
            "Standup",
            "2025-03-10T09:00:00Z",
            "2025-03-10T09:15:00Z",
        )])
        .with_sync_token("t1")));

        let prefs: Arc<dyn Preferences> =
            Arc::new(MemoryPreferences::new().with_value(keys::CALENDAR_ID, "team@example.com"));
        let (clock, _) = manual_clock(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap());

        let source = GoogleEventSource::with_query(query.clone(), prefs, Utc, SyncConfig::default())
            .unwrap();
        let source = GoogleEventSource::from_engine(source.engine.into_inner().with_clock(clock));

        let events = source.day_events(day(), false).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_notifiable());

        assert!(source.mark_notified("1").await);
        let events = source.day_events(day(), false).await.unwrap();
        assert!(!events[0].is_notifiable());

        let requests = query.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].calendar_id, "team@example.com");
        assert!(matches!(requests[0].scope, ListScope::Window { .. }));
    }

    #[tokio::test]
    async fn concurrent_reads_fetch_once() {
        let query = FakeQuery::new();
        query.push(Ok(ListResponse::default().with_sync_token("t1")));
        let prefs: Arc<dyn Preferences> = Arc::new(MemoryPreferences::new());
        let source = Arc::new(
            GoogleEventSource::with_query(query.clone(), prefs, Utc, SyncConfig::default())
                .unwrap(),
        );

        let (a, b) = tokio::join!(source.day_events(day(), false), source.day_events(day(), false));
        assert!(a.unwrap().is_empty());
        assert!(b.unwrap().is_empty());
        assert_eq!(query.requests().len(), 1);
    }
}
