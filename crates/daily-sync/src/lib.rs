//! Calendar sync engine for the daily agenda.
//!
//! - [`WindowTracker`] - which local days the cache covers and when to refresh
//! - [`EventCache`] - events of the tracked window, keyed and ordered
//! - [`SyncEngine`] - full and incremental fetches, reconciliation
//! - [`EventSource`] - the read facade, Google-backed or fixture
//! - [`Scheduler`] - the polling loop behind `daily watch`
//! - [`NotificationProcessor`] and [`MeetingStatusDriver`] - tick consumers
//!
//! Preferences and credentials are reached through the [`Preferences`] and
//! [`SecretStore`] traits.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixture;
pub mod notify;
pub mod scheduler;
pub mod source;
pub mod status;
pub mod store;
pub mod window;

pub use cache::EventCache;
pub use config::SyncConfig;
pub use engine::{Clock, SyncEngine, SyncMode, reconcile, system_clock};
pub use error::{StoreError, StoreResult, SyncError, SyncResult};
pub use fixture::FixtureEventSource;
pub use notify::{DesktopNotifier, NotificationProcessor, Notifier, NotifyConfig, NotifyError};
pub use scheduler::{Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState};
pub use source::{EventSource, GoogleEventSource};
pub use status::{MeetingStatusDriver, StatusSink, current_meeting};
pub use store::{
    KeyringSecretStore, MemoryPreferences, MemorySecretStore, Preferences, SecretStore,
    TomlPreferences, keys,
};
pub use window::{RefreshDecision, WindowTracker};
