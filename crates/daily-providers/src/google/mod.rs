//! Google Calendar v3 backend.
//!
//! The client lists events with `singleEvents=true` so recurring series are
//! expanded server-side, follows `nextPageToken` until the last page and
//! surfaces `nextSyncToken` for incremental calls.

mod client;
mod config;
mod tokens;

pub use client::GoogleCalendarClient;
pub use config::{DEFAULT_API_BASE, DEFAULT_CALENDAR_ID, GoogleConfig};
pub use tokens::access_token_from_credential;
