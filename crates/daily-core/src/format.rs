//! Text formatting for agenda lines and reminders.
//!
//! Everything here is a pure function of an [`Event`] and a reference time so
//! callers (CLI, notification processor) stay deterministic under test.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::event::{Event, EventState};

/// Marker appended to titles of recurring events.
const RECURRING_MARKER: &str = " 🗘";

/// Formats a remaining duration, rounding partial minutes up.
///
/// Durations of an hour or more render as `"{h}h{m}m"`, shorter ones as
/// `"{m}m"`.
pub fn duration_text(remaining: Duration) -> String {
    let mut secs = remaining.num_seconds();
    if secs % 60 > 0 {
        secs += 60 - secs % 60;
    }

    let hours = secs / 3600;
    let minutes = secs / 60;
    if hours > 0 {
        format!("{}h{}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Builds the one-line agenda entry for an event.
///
/// The prefix is the time span in the given timezone (`"3:04-3:34PM "`),
/// followed by a countdown for started and upcoming events.
pub fn agenda_line<Tz>(event: &Event, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let start = event.start().with_timezone(tz);
    let end = event.end().with_timezone(tz);
    let mut line = format!("{}-{} ", start.format("%-I:%M"), end.format("%-I:%M%p"));

    match event.state_at(now) {
        EventState::Finished => line.push_str(event.title()),
        EventState::Started => {
            let left = duration_text(event.end() - now);
            line.push_str(&format!("({} left) {}", left, event.title()));
        }
        EventState::Upcoming => {
            let until = duration_text(event.start() - now);
            line.push_str(&format!("(in {}) {}", until, event.title()));
        }
    }

    if event.is_recurring() {
        line.push_str(RECURRING_MARKER);
    }
    line
}

/// The text of a pre-start reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationText {
    pub title: String,
    pub body: String,
    /// Meeting link to attach, when the location is one.
    pub link: Option<String>,
}

/// Builds the reminder text for an event starting in `time_to_start`.
pub fn notification_text(event: &Event, time_to_start: Duration) -> NotificationText {
    let remaining = round_to_minutes(time_to_start);

    let mut title = format!("'{}' is starting soon", event.title());
    let body = if remaining == 1 {
        "1 minute to event".to_string()
    } else {
        format!("{} minutes to event", remaining)
    };
    if remaining <= 0 {
        title = format!("'{}' is starting now", event.title());
    }

    let link = event
        .is_virtual_meeting()
        .then(|| event.location().to_string());

    NotificationText { title, body, link }
}

/// Rounds to the nearest whole minute, halfway cases away from zero.
fn round_to_minutes(duration: Duration) -> i64 {
    let millis = duration.num_milliseconds();
    if millis >= 0 {
        (millis + 30_000) / 60_000
    } else {
        -((-millis + 30_000) / 60_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Duration {
        // "1h59m01s" style fixtures
        let (h, rest) = text.split_once('h').unwrap();
        let (m, rest) = rest.split_once('m').unwrap();
        let s = rest.trim_end_matches('s');
        Duration::hours(h.parse().unwrap())
            + Duration::minutes(m.parse().unwrap())
            + Duration::seconds(s.parse().unwrap())
    }

    fn event_at(start: DateTime<Utc>, minutes: i64) -> Event {
        Event::new("evt", "Planning", start, start + Duration::minutes(minutes)).unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn duration_text_rounds_up() {
        let cases = [
            ("2h00m00s", "2h0m"),
            ("1h59m59s", "2h0m"),
            ("1h59m01s", "2h0m"),
            ("0h59m59s", "1h0m"),
            ("0h59m01s", "1h0m"),
            ("1h00m00s", "1h0m"),
            ("0h01m59s", "2m"),
            ("0h01m01s", "2m"),
            ("0h01m00s", "1m"),
            ("0h00m59s", "1m"),
            ("0h00m01s", "1m"),
        ];

        for (i, (input, expected)) in cases.iter().enumerate() {
            assert_eq!(
                duration_text(parse(input)),
                *expected,
                "case {} ({})",
                i,
                input
            );
        }
    }

    #[test]
    fn agenda_line_for_each_state() {
        let start = noon();
        let event = event_at(start, 30);

        insta::assert_snapshot!(
            agenda_line(&event, start - Duration::minutes(90), &Utc),
            @"12:00-12:30PM (in 1h30m) Planning"
        );
        insta::assert_snapshot!(
            agenda_line(&event, start + Duration::minutes(10), &Utc),
            @"12:00-12:30PM (20m left) Planning"
        );
        insta::assert_snapshot!(
            agenda_line(&event, start + Duration::hours(2), &Utc),
            @"12:00-12:30PM Planning"
        );
    }

    #[test]
    fn agenda_line_marks_recurring() {
        let event = event_at(noon(), 30).with_recurring(true);
        let line = agenda_line(&event, noon() + Duration::hours(1), &Utc);
        assert!(line.ends_with("Planning 🗘"));
    }

    #[test]
    fn agenda_line_uses_timezone() {
        let tz = chrono::FixedOffset::west_opt(4 * 3600).unwrap();
        let event = event_at(noon(), 45);
        let line = agenda_line(&event, noon() + Duration::hours(1), &tz);
        assert_eq!(line, "8:00-8:45AM Planning");
    }

    #[test]
    fn notification_soon() {
        let event = event_at(noon(), 30);
        let text = notification_text(&event, Duration::seconds(4 * 60 + 40));
        assert_eq!(text.title, "'Planning' is starting soon");
        assert_eq!(text.body, "5 minutes to event");
        assert!(text.link.is_none());
    }

    #[test]
    fn notification_single_minute() {
        let event = event_at(noon(), 30);
        let text = notification_text(&event, Duration::seconds(50));
        assert_eq!(text.title, "'Planning' is starting soon");
        assert_eq!(text.body, "1 minute to event");
    }

    #[test]
    fn notification_starting_now_carries_link() {
        let event = event_at(noon(), 30).with_location("https://meet.google.com/abc");
        let text = notification_text(&event, Duration::seconds(20));
        assert_eq!(text.title, "'Planning' is starting now");
        assert_eq!(text.body, "0 minutes to event");
        assert_eq!(text.link.as_deref(), Some("https://meet.google.com/abc"));
    }

    #[test]
    fn rounding_is_symmetric() {
        assert_eq!(round_to_minutes(Duration::seconds(30)), 1);
        assert_eq!(round_to_minutes(Duration::seconds(29)), 0);
        assert_eq!(round_to_minutes(Duration::seconds(-30)), -1);
        assert_eq!(round_to_minutes(Duration::seconds(-29)), 0);
    }
}
