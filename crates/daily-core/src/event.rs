//! Event types for calendar events.
//!
//! This module provides the canonical record for one calendar occurrence:
//! - [`Event`]: an immutable, provider-agnostic event
//! - [`ResponseStatus`]: the owning user's RSVP
//! - [`EventState`]: where an event sits relative to "now"

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::time::is_on_day;

/// The owning user's response to an event invitation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    /// No RSVP information (not invited, or the user owns the event).
    #[default]
    Unset,
    /// The user has not responded yet.
    NeedsAction,
    /// The user declined.
    Declined,
    /// The user tentatively accepted.
    Tentative,
    /// The user accepted.
    Accepted,
}

impl ResponseStatus {
    /// Parses the provider's wire value. Unknown values map to `Unset`.
    pub fn from_provider(value: &str) -> Self {
        match value {
            "needsAction" => Self::NeedsAction,
            "declined" => Self::Declined,
            "tentative" => Self::Tentative,
            "accepted" => Self::Accepted,
            _ => Self::Unset,
        }
    }

    /// Returns the provider's wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::NeedsAction => "needsAction",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
            Self::Accepted => "accepted",
        }
    }
}

/// Errors raised while building an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The end timestamp precedes the start timestamp.
    #[error("event {id} ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Where an event sits relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    /// The event ended before now.
    Finished,
    /// The event started before now and has not ended.
    Started,
    /// The event has not started yet.
    Upcoming,
}

/// One calendar occurrence.
///
/// Events are immutable once built; state transitions such as consuming a
/// reminder produce a modified copy (see [`Event::with_notifiable`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: String,
    title: String,
    details: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    location: String,
    notifiable: bool,
    response: ResponseStatus,
    recurring: bool,
}

impl Event {
    /// Creates an event spanning `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EndBeforeStart`] if `end < start`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        let id = id.into();
        if end < start {
            return Err(EventError::EndBeforeStart { id, start, end });
        }

        Ok(Self {
            id,
            title: title.into(),
            details: String::new(),
            start,
            end,
            location: String::new(),
            notifiable: false,
            response: ResponseStatus::Unset,
            recurring: false,
        })
    }

    /// Builder method to set the free-text details (may be HTML).
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Builder method to set the location (plain text or meeting URL).
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set whether a pre-start reminder should fire.
    pub fn with_notifiable(mut self, notifiable: bool) -> Self {
        self.notifiable = notifiable;
        self
    }

    /// Builder method to set the user's response.
    pub fn with_response(mut self, response: ResponseStatus) -> Self {
        self.response = response;
        self
    }

    /// Builder method to mark as part of a recurring series.
    pub fn with_recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_notifiable(&self) -> bool {
        self.notifiable
    }

    pub fn response(&self) -> ResponseStatus {
        self.response
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring
    }

    /// Returns true if the event ended before `now`.
    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }

    /// Returns true if the event started before `now` and ends after it.
    pub fn is_started_at(&self, now: DateTime<Utc>) -> bool {
        self.start < now && self.end > now
    }

    /// Classifies the event relative to `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> EventState {
        if self.is_finished_at(now) {
            EventState::Finished
        } else if self.is_started_at(now) {
            EventState::Started
        } else {
            EventState::Upcoming
        }
    }

    /// Returns true if the location is a meeting link.
    pub fn is_virtual_meeting(&self) -> bool {
        self.location.starts_with("https://") || self.location.starts_with("http://")
    }

    /// Returns the parsed meeting link, if the location is one.
    pub fn meeting_url(&self) -> Option<Url> {
        if !self.is_virtual_meeting() {
            return None;
        }
        Url::parse(&self.location).ok()
    }

    /// Checks whether the event starts on `day` in the given timezone.
    pub fn starts_on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> bool {
        is_on_day(self.start, day, tz)
    }

    /// Orders events by start time, then title.
    pub fn chronological(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.title.cmp(&other.title))
    }
}

/// Sorts events by `(start, title)` ascending.
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by(Event::chronological);
}
