//! `daily watch`: the polling loop.
//!
//! Every tick reads today's agenda, sends due reminders and, when Mattermost
//! is configured, shows the ongoing meeting as the user's status. On Unix,
//! `SIGUSR1` forces a calendar refresh.

use std::sync::Arc;

use chrono::{Local, Utc};
use daily_sync::notify::DEFAULT_LEAD_MINUTES;
use daily_sync::{
    DesktopNotifier, EventSource, MeetingStatusDriver, NotificationProcessor, Preferences,
    Scheduler, SecretStore, SyncError, keys,
};
use daily_providers::mattermost::MattermostClient;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::ClientResult;

type StatusDriver = Arc<Mutex<Option<MeetingStatusDriver<MattermostClient>>>>;

pub async fn run(
    source: Arc<dyn EventSource>,
    secrets: &dyn SecretStore,
    prefs: &dyn Preferences,
    config: &ClientConfig,
) -> ClientResult<()> {
    let lead = prefs.get_u64_or(keys::NOTIFICATION_TIME, DEFAULT_LEAD_MINUTES)?;
    let notify_config = config.notify_config(lead);
    let processor = Arc::new(NotificationProcessor::new(
        notify_config.clone(),
        DesktopNotifier::new(&notify_config),
    ));

    let status: StatusDriver = if config.mattermost.enabled {
        let timeout = config.sync_config().request_timeout;
        Arc::new(Mutex::new(MeetingStatusDriver::from_stores(secrets, prefs, timeout)?))
    } else {
        Arc::new(Mutex::new(None))
    };

    let scheduler = Scheduler::new(config.scheduler_config());
    let handle = scheduler.handle();
    #[cfg(unix)]
    refresh_on_signal(handle.clone())?;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, stopping");
            let _ = handle.stop().await;
        }
    });

    info!(lead_minutes = lead, "watching calendar");
    scheduler
        .run(move |force| {
            let source = source.clone();
            let processor = processor.clone();
            let status = status.clone();
            async move { tick(source.as_ref(), &processor, &status, force).await }
        })
        .await;
    Ok(())
}

/// Sends a refresh to the scheduler on every `SIGUSR1`.
#[cfg(unix)]
fn refresh_on_signal(handle: daily_sync::SchedulerHandle) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut usr1 = signal(SignalKind::user_defined1())?;
    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            info!("SIGUSR1 received, refreshing calendar");
            if handle.refresh().await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

async fn tick(
    source: &dyn EventSource,
    processor: &NotificationProcessor<DesktopNotifier>,
    status: &StatusDriver,
    force: bool,
) -> Result<(), SyncError> {
    let today = Local::now().date_naive();
    let events = source.day_events(today, force).await?;
    let now = Utc::now();

    processor.process(&events, source, now).await;

    let mut status = status.lock().await;
    if let Some(driver) = status.as_mut() {
        if let Err(e) = driver.update(&events, now).await {
            warn!(error = %e, "failed to update meeting status");
        }
    }
    Ok(())
}
