//! Core types: events, day windows, formatting, detail cleaning

pub mod details;
pub mod event;
pub mod format;
pub mod time;
pub mod tracing;

pub use details::{clean_details, is_html, linkify};
pub use event::{Event, EventError, EventState, ResponseStatus, sort_chronologically};
pub use format::{NotificationText, agenda_line, duration_text, notification_text};
pub use time::{SyncWindow, is_on_day, local_midnight_utc};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
