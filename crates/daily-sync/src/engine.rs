//! Remote sync engine.
//!
//! The engine owns the window tracker and the event cache. A refresh lists
//! either the whole recentred window or the changes since the persisted sync
//! token, reconciles the result against the cache off to the side and swaps
//! it in. The window moves only once a refresh fully succeeded.
//!
//! ```text
//! day_events(day, force)
//!     │
//!     ├── decide ──▶ None ────────────────────────────┐
//!     │              Incremental ─▶ list(syncToken) ──┤── 410 ─▶ list(window)
//!     │              Full ────────▶ list(window) ─────┤
//!     │                                               ▼
//!     │                                   reconcile ─▶ persist token ─▶ swap cache ─▶ commit window
//!     ▼
//! cache.events_on(day)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use daily_core::Event;
use daily_providers::{
    CalendarQuery, ListRequest, ListResponse, NormalizeError, RawItem, normalize_item,
};
use tracing::{debug, info, trace, warn};

use crate::cache::EventCache;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::store::{Preferences, keys};
use crate::window::{RefreshDecision, WindowTracker};

/// Source of the current instant.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// How a refresh lists the remote calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Full,
    Incremental,
}

impl RefreshDecision {
    pub fn mode(&self) -> Option<SyncMode> {
        match self {
            Self::None => None,
            Self::Incremental => Some(SyncMode::Incremental),
            Self::Full => Some(SyncMode::Full),
        }
    }
}

/// Applies listed items to `base`.
///
/// Cancelled items remove their id. Live items are normalized against `now`
/// and upserted; ids in `notified` stay non-notifiable. All-day items carry
/// no concrete timestamps and are dropped.
///
/// # Errors
///
/// Fails on the first item that does not normalize. `base` is consumed either
/// way, so callers pass a copy of what they want to keep.
pub fn reconcile(
    mut base: HashMap<String, Event>,
    items: &[RawItem],
    now: DateTime<Utc>,
    notified: &HashSet<String>,
) -> Result<HashMap<String, Event>, NormalizeError> {
    for item in items {
        if item.is_cancelled() {
            if base.remove(&item.id).is_some() {
                trace!(id = %item.id, "removed cancelled event");
            }
            continue;
        }

        match normalize_item(item, now)? {
            Some(event) => {
                let event = if notified.contains(event.id()) {
                    event.with_notifiable(false)
                } else {
                    event
                };
                base.insert(event.id().to_string(), event);
            }
            None => {
                trace!(id = %item.id, "skipping all-day event");
                base.remove(&item.id);
            }
        }
    }
    Ok(base)
}

/// Sliding-window sync engine over one remote calendar.
pub struct SyncEngine<Q, Tz = Local> {
    query: Q,
    prefs: Arc<dyn Preferences>,
    tz: Tz,
    calendar_id: String,
    update_interval: Duration,
    tracker: WindowTracker,
    cache: EventCache,
    notified: HashSet<String>,
    last_refresh: Option<DateTime<Utc>>,
    clock: Clock,
}

impl<Q, Tz> SyncEngine<Q, Tz>
where
    Q: CalendarQuery,
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    pub fn new(
        query: Q,
        prefs: Arc<dyn Preferences>,
        tz: Tz,
        calendar_id: impl Into<String>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            query,
            prefs,
            tz,
            calendar_id: calendar_id.into(),
            update_interval: config.update_interval,
            tracker: WindowTracker::from_config(config),
            cache: EventCache::new(),
            notified: HashSet::new(),
            last_refresh: None,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn tracker(&self) -> &WindowTracker {
        &self.tracker
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    fn sync_token(&self) -> SyncResult<Option<String>> {
        Ok(self
            .prefs
            .get_string(keys::SYNC_TOKEN)?
            .filter(|token| !token.is_empty()))
    }

    /// Returns true once the last successful refresh is older than the
    /// update interval.
    pub fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        self.last_refresh.is_some_and(|last| {
            (now - last)
                .to_std()
                .is_ok_and(|elapsed| elapsed > self.update_interval)
        })
    }

    /// Decides how a read of `day` is served.
    pub fn decide(&self, day: NaiveDate, force: bool) -> SyncResult<RefreshDecision> {
        let has_token = self.sync_token()?.is_some();
        Ok(self
            .tracker
            .decide(day, force, has_token, self.cache.is_empty()))
    }

    /// Refreshes the cache around `day`.
    ///
    /// An incremental refresh whose token the provider rejects as expired
    /// drops the token and falls back to one full listing.
    ///
    /// # Errors
    ///
    /// Any other provider, parse or store failure is returned and leaves the
    /// cache and the window untouched.
    pub async fn retrieve_around(&mut self, day: NaiveDate, mode: SyncMode) -> SyncResult<()> {
        let now = (self.clock)();
        let window = self.tracker.candidate(day);
        let token = match mode {
            SyncMode::Incremental => self.sync_token()?,
            SyncMode::Full => None,
        };

        let (response, incremental) = match token {
            Some(token) => {
                debug!(calendar = %self.calendar_id, "listing changes since sync token");
                let request = ListRequest::since(&self.calendar_id, token);
                match self.query.list_events(request).await {
                    Ok(response) => (response, true),
                    Err(e) if e.is_sync_token_expired() => {
                        warn!(provider = self.query.name(), "sync token expired, running a full sync");
                        self.prefs.remove(keys::SYNC_TOKEN)?;
                        (self.list_window(day).await?, false)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => (self.list_window(day).await?, false),
        };

        let base = if incremental {
            self.cache.snapshot()
        } else {
            HashMap::new()
        };
        let merged = reconcile(base, &response.items, now, &self.notified)?;

        if let Some(token) = &response.next_sync_token {
            self.prefs.set_string(keys::SYNC_TOKEN, token)?;
        }

        info!(
            items = response.items.len(),
            events = merged.len(),
            incremental,
            start = %window.start_day,
            end = %window.end_day,
            "calendar refreshed"
        );
        self.notified.retain(|id| merged.contains_key(id));
        self.cache.replace(merged);
        self.tracker.commit(window);
        self.last_refresh = Some(now);
        Ok(())
    }

    async fn list_window(&self, day: NaiveDate) -> SyncResult<ListResponse> {
        let window = self.tracker.candidate(day);
        let (time_min, time_max) = window.to_utc_range(&self.tz);
        debug!(
            calendar = %self.calendar_id,
            %time_min,
            %time_max,
            "listing window"
        );
        let request = ListRequest::window(&self.calendar_id, time_min, time_max);
        Ok(self.query.list_events(request).await?)
    }

    /// Events starting on `day`, refreshing first when needed.
    ///
    /// A refresh is forced when `force` is set or the update interval has
    /// elapsed since the last one.
    pub async fn day_events(&mut self, day: NaiveDate, force: bool) -> SyncResult<Vec<Event>> {
        let now = (self.clock)();
        let stale = self.refresh_due(now);
        if stale {
            debug!("update interval elapsed");
        }

        let decision = self.decide(day, force || stale)?;
        if let Some(mode) = decision.mode() {
            self.retrieve_around(day, mode).await?;
        }
        Ok(self.events_on(day))
    }

    /// Cached events starting on `day` in the engine's timezone.
    pub fn events_on(&self, day: NaiveDate) -> Vec<Event> {
        self.cache.events_on(day, &self.tz)
    }

    /// Records that the reminder for `id` was delivered.
    ///
    /// Returns false if the id is not cached.
    pub fn mark_notified(&mut self, id: &str) -> bool {
        let known = self.cache.update(id, |e| e.clone().with_notifiable(false));
        if known {
            self.notified.insert(id.to_string());
        }
        known
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use daily_providers::{BoxFuture, ProviderResult};

    use super::*;

    /// A calendar that replays queued responses and records requests.
    #[derive(Default)]
    pub struct FakeQuery {
        responses: Mutex<VecDeque<ProviderResult<ListResponse>>>,
        requests: Mutex<Vec<ListRequest>>,
    }

    impl FakeQuery {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn push(&self, response: ProviderResult<ListResponse>) {
            self.responses.lock().unwrap().push_back(response);
        }

        pub fn requests(&self) -> Vec<ListRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl CalendarQuery for FakeQuery {
        fn name(&self) -> &str {
            "fake"
        }

        fn list_events(&self, request: ListRequest) -> BoxFuture<'_, ProviderResult<ListResponse>> {
            self.requests.lock().unwrap().push(request);
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ListResponse::default()));
            Box::pin(async move { response })
        }
    }

    /// A settable clock.
    pub fn manual_clock(start: DateTime<Utc>) -> (Clock, Arc<Mutex<DateTime<Utc>>>) {
        let now = Arc::new(Mutex::new(start));
        let handle = now.clone();
        (Arc::new(move || *handle.lock().unwrap()), now)
    }
}
