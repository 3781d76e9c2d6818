//! Subcommand implementations.

pub mod agenda;
pub mod auth;
pub mod config;
pub mod watch;

use std::sync::Arc;

use daily_sync::{EventSource, FixtureEventSource, GoogleEventSource, Preferences, SecretStore};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Picks the agenda backend for this run.
///
/// # Errors
///
/// Fails with an authorization error when the calendar is selected and no
/// credential is stored.
pub fn event_source(
    fixture: bool,
    secrets: &dyn SecretStore,
    prefs: Arc<dyn Preferences>,
    config: &ClientConfig,
) -> ClientResult<Arc<dyn EventSource>> {
    if fixture {
        info!("using fixture events");
        return Ok(Arc::new(FixtureEventSource::new()));
    }
    let source = GoogleEventSource::new(secrets, prefs, config.sync_config())?;
    Ok(Arc::new(source))
}
