//! Raw calendar items as returned by the remote service.
//!
//! [`RawItem`] mirrors the subset of the Google Calendar v3 event resource
//! selected by the list request's `fields` mask. It is deserialized directly
//! from the wire and converted to a [`daily_core::Event`] by
//! [`crate::normalize`].

use daily_core::ResponseStatus;
use serde::{Deserialize, Serialize};

/// Entry point type carrying the meeting's video link.
const VIDEO_ENTRY_POINT: &str = "video";

/// A start or end time. Timed events carry `date_time`; all-day events carry
/// only `date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl RawTime {
    pub fn date_time(value: impl Into<String>) -> Self {
        Self {
            date: None,
            date_time: Some(value.into()),
        }
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self {
            date: Some(value.into()),
            date_time: None,
        }
    }
}

/// An attendee entry. Only the owning user's own entry matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttendee {
    #[serde(rename = "self", default)]
    pub is_self: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
}

impl RawAttendee {
    /// The owning user's attendee entry.
    pub fn myself(response_status: impl Into<String>) -> Self {
        Self {
            is_self: true,
            response_status: Some(response_status.into()),
        }
    }

    /// Another attendee.
    pub fn other(response_status: impl Into<String>) -> Self {
        Self {
            is_self: false,
            response_status: Some(response_status.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntryPoint {
    #[serde(default)]
    pub entry_point_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConferenceData {
    #[serde(default)]
    pub entry_points: Vec<RawEntryPoint>,
}

/// One item of a list response: an added, changed or cancelled event.
///
/// Incremental responses report deletions as items with
/// `status = "cancelled"` and little else, so every field but `id` is
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<RawTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<RawTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<RawAttendee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hangout_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_data: Option<RawConferenceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
}

impl RawItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// A deletion marker for `id`.
    pub fn cancelled(id: impl Into<String>) -> Self {
        Self::new(id).with_status("cancelled")
    }

    /// A timed item with RFC 3339 start and end.
    pub fn timed(
        id: impl Into<String>,
        summary: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self::new(id)
            .with_summary(summary)
            .with_status("confirmed")
            .with_start(RawTime::date_time(start))
            .with_end(RawTime::date_time(end))
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_start(mut self, start: RawTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: RawTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_transparency(mut self, transparency: impl Into<String>) -> Self {
        self.transparency = Some(transparency.into());
        self
    }

    pub fn with_attendee(mut self, attendee: RawAttendee) -> Self {
        self.attendees.push(attendee);
        self
    }

    pub fn with_hangout_link(mut self, link: impl Into<String>) -> Self {
        self.hangout_link = Some(link.into());
        self
    }

    /// Adds a conference entry point of the given type.
    pub fn with_entry_point(
        mut self,
        entry_point_type: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        self.conference_data
            .get_or_insert_with(RawConferenceData::default)
            .entry_points
            .push(RawEntryPoint {
                entry_point_type: entry_point_type.into(),
                uri: Some(uri.into()),
            });
        self
    }

    pub fn with_recurring_event_id(mut self, id: impl Into<String>) -> Self {
        self.recurring_event_id = Some(id.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }

    pub fn is_transparent(&self) -> bool {
        self.transparency.as_deref() == Some("transparent")
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring_event_id.is_some()
    }

    /// Returns true unless both ends carry a concrete timestamp.
    pub fn is_all_day(&self) -> bool {
        let timed = |time: &Option<RawTime>| {
            time.as_ref()
                .and_then(|t| t.date_time.as_deref())
                .is_some_and(|s| !s.is_empty())
        };
        !(timed(&self.start) && timed(&self.end))
    }

    /// The owning user's RSVP, from the attendee flagged `self`.
    pub fn self_response(&self) -> ResponseStatus {
        self.attendees
            .iter()
            .find(|a| a.is_self)
            .and_then(|a| a.response_status.as_deref())
            .map(ResponseStatus::from_provider)
            .unwrap_or_default()
    }

    /// Best location: video entry point, then Hangouts link, then the plain
    /// location text.
    pub fn preferred_location(&self) -> String {
        let video = self.conference_data.as_ref().and_then(|conf| {
            conf.entry_points
                .iter()
                .find(|ep| ep.entry_point_type == VIDEO_ENTRY_POINT)
                .and_then(|ep| ep.uri.as_deref())
                .filter(|uri| !uri.is_empty())
        });

        video
            .or(self.hangout_link.as_deref().filter(|l| !l.is_empty()))
            .or(self.location.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}
