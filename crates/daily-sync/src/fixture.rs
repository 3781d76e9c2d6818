//! Canned agenda for demos and offline runs.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, DurationRound, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use daily_core::{Event, ResponseStatus, sort_chronologically};
use daily_providers::BoxFuture;
use tracing::debug;

use crate::error::SyncResult;
use crate::source::EventSource;

#[derive(Debug, Default)]
struct Buckets {
    yesterday: Vec<Event>,
    today: Vec<Event>,
    tomorrow: Vec<Event>,
}

impl Buckets {
    fn all_mut(&mut self) -> impl Iterator<Item = &mut Event> {
        self.yesterday
            .iter_mut()
            .chain(self.today.iter_mut())
            .chain(self.tomorrow.iter_mut())
    }
}

/// Serves fixed events relative to its construction time.
///
/// Any day before the construction day answers with the "yesterday" set, any
/// day after with the "tomorrow" set.
#[derive(Debug)]
pub struct FixtureEventSource<Tz: TimeZone = Local> {
    today: NaiveDate,
    tz: Tz,
    buckets: Mutex<Buckets>,
}

impl FixtureEventSource<Local> {
    pub fn new() -> Self {
        Self::at(Utc::now(), Local)
    }
}

impl Default for FixtureEventSource<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone> FixtureEventSource<Tz> {
    /// The sample agenda around `now`.
    pub fn at(now: DateTime<Utc>, tz: Tz) -> Self {
        let now = now.duration_trunc(TimeDelta::minutes(1)).unwrap_or(now);
        let past = now - Duration::hours(3);
        let day = Duration::days(1);
        let half_hour = Duration::minutes(30);

        let yesterday = [sample("1", "past event yesterday with zoom", past - day, now - day + half_hour)
            .map(|e| e.with_location("http://www.zoom.us/1234").with_details("Past event"))];

        let today = [
            sample("2", "past event", past, past + half_hour).map(|e| {
                e.with_location("location1")
                    .with_details("details1")
                    .with_response(ResponseStatus::Accepted)
            }),
            sample(
                "3",
                "past event with zoom meeting",
                past + Duration::hours(1),
                past + Duration::hours(1) + half_hour,
            )
            .map(|e| {
                e.with_location("http://www.zoom.us/1234")
                    .with_details("details2")
                    .with_response(ResponseStatus::Declined)
            }),
            sample("4", "current event", now - Duration::minutes(10), now + half_hour).map(|e| {
                e.with_location("location3")
                    .with_details("details3 with link https://example.org/go")
                    .with_response(ResponseStatus::Declined)
                    .with_recurring(true)
            }),
            sample(
                "5",
                "A very long current event with zoom meeting that is longer than the rest",
                now,
                now + Duration::minutes(1),
            )
            .map(|e| {
                e.with_location("https://www.zoom.us/2345")
                    .with_details("details4 <a href='https://example.com/go'>https://example.com/go</a>")
                    .with_response(ResponseStatus::Tentative)
            }),
            sample(
                "6",
                "future event today with html details & others",
                now + Duration::minutes(1),
                now + Duration::hours(6) + half_hour,
            )
            .map(|e| {
                e.with_location("location5")
                    .with_details(ZOOM_INVITE)
                    .with_response(ResponseStatus::NeedsAction)
            }),
            sample(
                "7",
                "future event today with gmeeting",
                now + Duration::minutes(2),
                now + Duration::hours(7) + half_hour,
            )
            .map(|e| {
                e.with_location("https://meet.google.com/3456?a=33&b=66")
                    .with_details("An event in Google Meeting")
                    .with_notifiable(true)
                    .with_response(ResponseStatus::Accepted)
            }),
        ];

        let tomorrow = [sample("8", "future event tomorrow with gmeeting", past + day, now + day + half_hour)
            .map(|e| e.with_location("https://meet.google.com/3456").with_details("Future Event"))];

        let buckets = Buckets {
            yesterday: collect(yesterday),
            today: collect(today),
            tomorrow: collect(tomorrow),
        };
        Self::from_buckets(now, tz, buckets)
    }

    /// A source whose construction day holds exactly `events`.
    pub fn with_today_events(now: DateTime<Utc>, tz: Tz, events: Vec<Event>) -> Self {
        let buckets = Buckets {
            today: collect(events.into_iter().map(Some)),
            ..Default::default()
        };
        Self::from_buckets(now, tz, buckets)
    }

    fn from_buckets(now: DateTime<Utc>, tz: Tz, buckets: Buckets) -> Self {
        Self {
            today: now.with_timezone(&tz).date_naive(),
            tz,
            buckets: Mutex::new(buckets),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn events_for(&self, day: NaiveDate) -> Vec<Event> {
        let buckets = self.lock();
        if day == self.today {
            buckets.today.clone()
        } else if day < self.today {
            buckets.yesterday.clone()
        } else {
            buckets.tomorrow.clone()
        }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }
}

const ZOOM_INVITE: &str = "<p><br>──────────<br><br>Join Zoom Meeting<br>https://www.zoom.us/j/1111?pwd=11111<br>Meeting ID: 111<br>  Password: 11111<br>Phone number :US: +1 564 217 2000<br><br>One touch:8# US<br><br>Find your local number: https://www.zoom.us/u/acsyqrWx7k<br><br><br>──────────</p>";

fn sample(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Event> {
    Event::new(id, title, start, end).ok()
}

fn collect(events: impl IntoIterator<Item = Option<Event>>) -> Vec<Event> {
    let mut events: Vec<Event> = events.into_iter().flatten().collect();
    sort_chronologically(&mut events);
    events
}

impl<Tz> EventSource for FixtureEventSource<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    fn day_events(&self, day: NaiveDate, force: bool) -> BoxFuture<'_, SyncResult<Vec<Event>>> {
        debug!(%day, force, "serving fixture events");
        let events = self.events_for(day);
        Box::pin(async move { Ok(events) })
    }

    fn mark_notified<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool> {
        let mut buckets = self.lock();
        let mut known = false;
        for event in buckets.all_mut().filter(|e| e.id() == id) {
            *event = event.clone().with_notifiable(false);
            known = true;
        }
        Box::pin(async move { known })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 42).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(Event::id).collect()
    }

    #[tokio::test]
    async fn buckets_by_day() {
        let source = FixtureEventSource::at(now(), Utc);

        let today = source.day_events(date(10), false).await.unwrap();
        assert_eq!(ids(&today), ["2", "3", "4", "5", "6", "7"]);
        assert_eq!(ids(&source.day_events(date(9), false).await.unwrap()), ["1"]);
        assert_eq!(ids(&source.day_events(date(1), true).await.unwrap()), ["1"]);
        assert_eq!(ids(&source.day_events(date(11), false).await.unwrap()), ["8"]);
    }

    #[tokio::test]
    async fn times_are_relative_to_the_minute() {
        let source = FixtureEventSource::at(now(), Utc);
        let today = source.day_events(date(10), false).await.unwrap();

        let current = today.iter().find(|e| e.id() == "5").unwrap();
        assert_eq!(current.start(), Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap());
        assert!(today.iter().find(|e| e.id() == "4").unwrap().is_recurring());
    }

    #[tokio::test]
    async fn mark_notified_disarms_the_event() {
        let source = FixtureEventSource::at(now(), Utc);
        assert!(source.mark_notified("7").await);
        assert!(!source.mark_notified("missing").await);

        let today = source.day_events(date(10), false).await.unwrap();
        assert!(today.iter().all(|e| !e.is_notifiable()));
    }

    #[tokio::test]
    async fn custom_today_events() {
        let start = now();
        let event = Event::new("x", "Only", start, start + Duration::minutes(5)).unwrap();
        let source = FixtureEventSource::with_today_events(start, Utc, vec![event]);

        assert_eq!(ids(&source.day_events(date(10), false).await.unwrap()), ["x"]);
        assert!(source.day_events(date(11), false).await.unwrap().is_empty());
    }
}
