//! RawItem to Event conversion.
//!
//! Normalization derives the fields the agenda needs from a wire item:
//! - start and end parsed from RFC 3339 into UTC
//! - `location` picked by [`RawItem::preferred_location`]
//! - `notifiable` from the user's RSVP, transparency and the reference time
//! - `recurring` from the presence of a series id

use chrono::{DateTime, Utc};
use daily_core::{Event, EventError, ResponseStatus};
use thiserror::Error;

use crate::raw_event::{RawItem, RawTime};

/// Errors raised while converting a [`RawItem`].
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("event {id}: invalid {field} timestamp {value:?}")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Converts a live item to an [`Event`].
///
/// Returns `Ok(None)` for all-day items, which carry no concrete timestamp.
/// Cancelled items must be handled by the caller before normalization.
///
/// # Errors
///
/// Fails if a timestamp does not parse or the end precedes the start.
pub fn normalize_item(raw: &RawItem, now: DateTime<Utc>) -> Result<Option<Event>, NormalizeError> {
    if raw.is_all_day() {
        return Ok(None);
    }

    let start = parse_time(&raw.id, "start", raw.start.as_ref())?;
    let end = parse_time(&raw.id, "end", raw.end.as_ref())?;
    let response = raw.self_response();

    let notifiable = response != ResponseStatus::Declined && !raw.is_transparent() && start > now;

    let event = Event::new(&raw.id, raw.summary.clone().unwrap_or_default(), start, end)?
        .with_details(raw.description.clone().unwrap_or_default())
        .with_location(raw.preferred_location())
        .with_notifiable(notifiable)
        .with_response(response)
        .with_recurring(raw.is_recurring());

    Ok(Some(event))
}

fn parse_time(
    id: &str,
    field: &'static str,
    time: Option<&RawTime>,
) -> Result<DateTime<Utc>, NormalizeError> {
    let value = time
        .and_then(|t| t.date_time.as_deref())
        .unwrap_or_default();

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| NormalizeError::InvalidTimestamp {
            id: id.to_string(),
            field,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_event::RawAttendee;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn item() -> RawItem {
        RawItem::timed(
            "evt",
            "Review",
            "2025-03-10T10:00:00-04:00",
            "2025-03-10T11:00:00-04:00",
        )
    }

    mod fields {
        use super::*;

        #[test]
        fn converts_timestamps_to_utc() {
            let event = normalize_item(&item(), now()).unwrap().unwrap();
            assert_eq!(event.id(), "evt");
            assert_eq!(event.title(), "Review");
            assert_eq!(event.start(), Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap());
            assert_eq!(event.end(), Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap());
        }

        #[test]
        fn copies_optional_fields() {
            let raw = item()
                .with_description("<p>notes</p>")
                .with_location("Room 1")
                .with_hangout_link("https://meet.google.com/a")
                .with_recurring_event_id("series")
                .with_attendee(RawAttendee::myself("accepted"));

            let event = normalize_item(&raw, now()).unwrap().unwrap();
            assert_eq!(event.details(), "<p>notes</p>");
            assert_eq!(event.location(), "https://meet.google.com/a");
            assert!(event.is_recurring());
            assert_eq!(event.response(), ResponseStatus::Accepted);
        }

        #[test]
        fn missing_summary_is_empty_title() {
            let mut raw = item();
            raw.summary = None;
            let event = normalize_item(&raw, now()).unwrap().unwrap();
            assert_eq!(event.title(), "");
        }
    }

    mod notifiable {
        use super::*;

        #[test]
        fn future_accepted_event_is_notifiable() {
            let event = normalize_item(&item(), now()).unwrap().unwrap();
            assert!(event.is_notifiable());
        }

        #[test]
        fn declined_is_not_notifiable() {
            let raw = item().with_attendee(RawAttendee::myself("declined"));
            let event = normalize_item(&raw, now()).unwrap().unwrap();
            assert!(!event.is_notifiable());
        }

        #[test]
        fn transparent_is_not_notifiable() {
            let raw = item().with_transparency("transparent");
            let event = normalize_item(&raw, now()).unwrap().unwrap();
            assert!(!event.is_notifiable());
        }

        #[test]
        fn started_is_not_notifiable() {
            let later = Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap();
            let event = normalize_item(&item(), later).unwrap().unwrap();
            assert!(!event.is_notifiable());
        }

        #[test]
        fn other_attendees_declining_does_not_matter() {
            let raw = item().with_attendee(RawAttendee::other("declined"));
            let event = normalize_item(&raw, now()).unwrap().unwrap();
            assert!(event.is_notifiable());
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn all_day_is_skipped() {
            let raw = RawItem::new("d")
                .with_start(RawTime::date("2025-03-10"))
                .with_end(RawTime::date("2025-03-11"));
            assert!(normalize_item(&raw, now()).unwrap().is_none());
        }

        #[test]
        fn malformed_timestamp_fails() {
            let raw = RawItem::timed("bad", "Bad", "tomorrow at ten", "2025-03-10T11:00:00Z");
            let err = normalize_item(&raw, now()).unwrap_err();
            assert!(matches!(
                err,
                NormalizeError::InvalidTimestamp { field: "start", ref id, .. } if id == "bad"
            ));
        }

        #[test]
        fn end_before_start_fails() {
            let raw = RawItem::timed("rev", "Rev", "2025-03-10T11:00:00Z", "2025-03-10T10:00:00Z");
            assert!(matches!(
                normalize_item(&raw, now()),
                Err(NormalizeError::Event(EventError::EndBeforeStart { .. }))
            ));
        }
    }
}
