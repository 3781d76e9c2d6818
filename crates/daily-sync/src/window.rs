//! Synchronization window tracking.
//!
//! The tracker remembers which local days the cache covers and decides, for
//! each read, whether the cache can answer as-is or needs an incremental or
//! full refresh first.

use chrono::NaiveDate;
use daily_core::SyncWindow;
use tracing::debug;

use crate::config::SyncConfig;

/// What a read must do before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Serve from the cache.
    None,
    /// Fetch changes since the held sync token.
    Incremental,
    /// Fetch the whole recentred window.
    Full,
}

impl RefreshDecision {
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone)]
pub struct WindowTracker {
    window: Option<SyncWindow>,
    half_window_days: u64,
    min_buffer_threshold: i64,
}

impl WindowTracker {
    pub fn new(half_window_days: u64, min_buffer_threshold: i64) -> Self {
        Self {
            window: None,
            half_window_days,
            min_buffer_threshold,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.half_window_days, config.min_buffer_threshold)
    }

    /// The window the cache currently covers.
    pub fn window(&self) -> Option<SyncWindow> {
        self.window
    }

    pub fn is_initialized(&self) -> bool {
        self.window.is_some()
    }

    /// The window a refresh for `day` would cover.
    pub fn candidate(&self, day: NaiveDate) -> SyncWindow {
        SyncWindow::around(day, self.half_window_days)
    }

    /// Returns true if reading `day` requires a fetch.
    pub fn needs_refresh(&self, day: NaiveDate, force: bool) -> bool {
        let Some(window) = self.window else {
            debug!(%day, "no window tracked yet");
            return true;
        };

        if !window.contains(day) {
            debug!(%day, start = %window.start_day, end = %window.end_day, "day outside window");
            return true;
        }

        if window.is_near_edge(day, self.min_buffer_threshold) {
            debug!(%day, start = %window.start_day, end = %window.end_day, "day too close to window edge");
            return true;
        }

        force
    }

    /// Decides how to serve a read of `day`.
    ///
    /// A required refresh is incremental only when a sync token is held, the
    /// cache has content and the recentred window starts where the tracked
    /// one does.
    pub fn decide(
        &self,
        day: NaiveDate,
        force: bool,
        has_sync_token: bool,
        cache_empty: bool,
    ) -> RefreshDecision {
        if !self.needs_refresh(day, force) {
            return RefreshDecision::None;
        }

        let candidate = self.candidate(day);
        let same_window = self
            .window
            .is_some_and(|w| w.start_day == candidate.start_day);

        if cache_empty || !has_sync_token || !same_window {
            RefreshDecision::Full
        } else {
            RefreshDecision::Incremental
        }
    }

    /// Records the window covered by a successful refresh.
    pub fn commit(&mut self, window: SyncWindow) {
        self.window = Some(window);
    }

    /// Forgets the tracked window.
    pub fn reset(&mut self) {
        self.window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn tracker_at(day: NaiveDate) -> WindowTracker {
        let mut tracker = WindowTracker::from_config(&SyncConfig::default());
        let window = tracker.candidate(day);
        tracker.commit(window);
        tracker
    }

    #[test]
    fn uninitialized_requires_full() {
        let tracker = WindowTracker::from_config(&SyncConfig::default());
        assert!(!tracker.is_initialized());
        assert_eq!(
            tracker.decide(date(3, 10), false, true, false),
            RefreshDecision::Full
        );
    }

    #[test]
    fn centre_and_nearby_days_are_served_from_cache() {
        let tracker = tracker_at(date(3, 10));
        for day in 7..=13 {
            assert_eq!(
                tracker.decide(date(3, day), false, true, false),
                RefreshDecision::None,
                "day {}",
                day
            );
        }
    }

    #[test]
    fn buffer_edge_triggers_full_recentre() {
        let tracker = tracker_at(date(3, 10));
        assert_eq!(
            tracker.decide(date(3, 6), false, true, false),
            RefreshDecision::Full
        );
        assert_eq!(
            tracker.decide(date(3, 14), false, true, false),
            RefreshDecision::Full
        );
        assert_eq!(tracker.candidate(date(3, 14)).start_day, date(3, 9));
    }

    #[test]
    fn outside_window_recentres_on_requested_day() {
        let tracker = tracker_at(date(3, 10));
        assert_eq!(
            tracker.decide(date(4, 20), false, true, false),
            RefreshDecision::Full
        );
        let candidate = tracker.candidate(date(4, 20));
        assert_eq!(candidate.start_day, date(4, 15));
        assert_eq!(candidate.end_day, date(4, 25));

        assert_eq!(
            tracker.decide(date(1, 2), false, true, false),
            RefreshDecision::Full
        );
    }

    #[test]
    fn forced_refresh_of_centre_is_incremental_with_token() {
        let tracker = tracker_at(date(3, 10));
        assert_eq!(
            tracker.decide(date(3, 10), true, true, false),
            RefreshDecision::Incremental
        );
    }

    #[test]
    fn forced_refresh_is_full_without_token_or_content() {
        let tracker = tracker_at(date(3, 10));
        assert_eq!(
            tracker.decide(date(3, 10), true, false, false),
            RefreshDecision::Full
        );
        assert_eq!(
            tracker.decide(date(3, 10), true, true, true),
            RefreshDecision::Full
        );
    }

    #[test]
    fn forced_refresh_off_centre_is_full() {
        let tracker = tracker_at(date(3, 10));
        assert_eq!(
            tracker.decide(date(3, 12), true, true, false),
            RefreshDecision::Full
        );
    }

    #[test]
    fn reset_forgets_window() {
        let mut tracker = tracker_at(date(3, 10));
        tracker.reset();
        assert!(tracker.window().is_none());
        assert!(tracker.decide(date(3, 10), false, true, false).needs_fetch());
    }
}
