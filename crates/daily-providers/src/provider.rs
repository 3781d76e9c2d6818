//! CalendarQuery trait definition.
//!
//! [`CalendarQuery`] is the seam between the sync engine and a remote
//! calendar. One call lists either every item in a time window (full sync)
//! or the changes since a sync token (incremental sync), following pagination
//! internally.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::error::ProviderResult;
use crate::raw_event::RawItem;

/// Field mask limiting list responses to what an `Event` needs.
pub const EVENT_FIELDS: &str = "nextPageToken,nextSyncToken,items(id,status,summary,description,location,start,end,transparency,attendees(self,responseStatus),hangoutLink,conferenceData(entryPoints(entryPointType,uri)),recurringEventId)";

/// What a list request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Every live item overlapping `[time_min, time_max)`.
    Window {
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    },
    /// Items changed since the token was issued, cancellations included.
    Since { sync_token: String },
}

/// A single list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub calendar_id: String,
    pub scope: ListScope,
    pub fields: String,
}

impl ListRequest {
    /// Full listing of a window.
    pub fn window(
        calendar_id: impl Into<String>,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            scope: ListScope::Window { time_min, time_max },
            fields: EVENT_FIELDS.to_string(),
        }
    }

    /// Changes since `sync_token`.
    pub fn since(calendar_id: impl Into<String>, sync_token: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            scope: ListScope::Since {
                sync_token: sync_token.into(),
            },
            fields: EVENT_FIELDS.to_string(),
        }
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self.scope, ListScope::Since { .. })
    }
}

/// Items across all pages plus the token for the next incremental call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResponse {
    pub items: Vec<RawItem>,
    pub next_sync_token: Option<String>,
}

impl ListResponse {
    pub fn with_items(items: Vec<RawItem>) -> Self {
        Self {
            items,
            next_sync_token: None,
        }
    }

    pub fn with_sync_token(mut self, token: impl Into<String>) -> Self {
        self.next_sync_token = Some(token.into());
        self
    }
}

/// A boxed future for async trait methods, keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A remote calendar that can be listed.
///
/// # Errors
///
/// Implementations report an invalidated sync token with
/// [`crate::ProviderErrorCode::SyncTokenExpired`] so callers can fall back to
/// a full listing.
pub trait CalendarQuery: Send + Sync {
    /// Short name used in logs and errors (e.g. "google").
    fn name(&self) -> &str;

    fn list_events(&self, request: ListRequest) -> BoxFuture<'_, ProviderResult<ListResponse>>;
}

impl<T: CalendarQuery + ?Sized> CalendarQuery for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_events(&self, request: ListRequest) -> BoxFuture<'_, ProviderResult<ListResponse>> {
        (**self).list_events(request)
    }
}
