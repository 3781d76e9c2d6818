//! `daily agenda`: print one day.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use daily_core::{Event, EventState, agenda_line, clean_details};
use daily_sync::EventSource;
use tracing::{debug, info};

use crate::cli::AgendaArgs;
use crate::error::{ClientError, ClientResult};

pub async fn run(source: &dyn EventSource, args: &AgendaArgs) -> ClientResult<()> {
    let now = Utc::now();
    let day = args.day.unwrap_or_else(|| Local::now().date_naive());
    debug!(%day, refresh = args.refresh, "loading agenda");

    let events = source.day_events(day, args.refresh).await?;
    print!("{}", render(&events, day, now, &Local, args.details));

    if args.open {
        match meeting_to_join(&events, now) {
            Some(url) => {
                info!(%url, "opening meeting");
                open::that(url).map_err(|e| ClientError::Action(format!("failed to open {}: {}", url, e)))?;
            }
            None => println!("No meeting link to open."),
        }
    }
    Ok(())
}

/// The agenda text: a header line, then one line per event.
pub fn render<Tz>(events: &[Event], day: NaiveDate, now: DateTime<Utc>, tz: &Tz, details: bool) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = format!("{}\n", day.format("%A, %B %-d"));
    if events.is_empty() {
        out.push_str("  No events\n");
        return out;
    }

    for event in events {
        out.push_str("  ");
        out.push_str(&agenda_line(event, now, tz));
        out.push('\n');

        if details && !event.details().trim().is_empty() {
            for line in clean_details(event.details()).lines() {
                if !line.trim().is_empty() {
                    out.push_str("      ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Link of the ongoing meeting, else of the next one.
pub fn meeting_to_join(events: &[Event], now: DateTime<Utc>) -> Option<&str> {
    let joinable = |state: EventState| {
        events
            .iter()
            .find(|e| e.state_at(now) == state && e.is_virtual_meeting())
    };
    joinable(EventState::Started)
        .or_else(|| joinable(EventState::Upcoming))
        .map(Event::location)
}
