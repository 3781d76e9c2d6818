//! Remote services behind the agenda.
//!
//! - [`CalendarQuery`] - the remote calendar query interface
//! - [`RawItem`] - an item as listed by the remote calendar
//! - [`normalize_item`] - conversion of a live item to a [`daily_core::Event`]
//! - [`ProviderError`] - error taxonomy shared by all remote calls
//!
//! ```text
//! ┌──────────────────┐
//! │ Google Calendar  │
//! └────────┬─────────┘
//!          │ events.list (window or syncToken, paginated)
//!          ▼
//! ┌──────────────────┐
//! │  CalendarQuery   │ ──▶ ListResponse { items: Vec<RawItem>, next_sync_token }
//! └──────────────────┘
//!                                   │
//!                                   ▼ normalize_item()
//!                              ┌─────────┐
//!                              │  Event  │
//!                              └─────────┘
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(feature = "mattermost")]
pub mod mattermost;
pub mod normalize;
pub mod provider;
pub mod raw_event;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{NormalizeError, normalize_item};
pub use provider::{BoxFuture, CalendarQuery, EVENT_FIELDS, ListRequest, ListResponse, ListScope};
pub use raw_event::{RawAttendee, RawConferenceData, RawEntryPoint, RawItem, RawTime};
