//! In-memory event cache for the tracked window.
//!
//! Events are held by id and as a `(start, title)`-ordered list. Refreshes
//! build a complete replacement map and swap it in with
//! [`EventCache::replace`], so readers never observe a half-merged state.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone};
use daily_core::{Event, sort_chronologically};
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct EventCache {
    by_id: HashMap<String, Event>,
    ordered: Vec<Event>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.by_id.get(id)
    }

    /// All events, ordered by `(start, title)`.
    pub fn events(&self) -> &[Event] {
        &self.ordered
    }

    /// A copy of the keyed map, used as the base of an incremental merge.
    pub fn snapshot(&self) -> HashMap<String, Event> {
        self.by_id.clone()
    }

    /// Replaces the whole content.
    pub fn replace(&mut self, events: HashMap<String, Event>) {
        let mut ordered: Vec<Event> = events.values().cloned().collect();
        sort_chronologically(&mut ordered);
        trace!(count = ordered.len(), "cache replaced");
        self.by_id = events;
        self.ordered = ordered;
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.ordered.clear();
    }

    /// Replaces the event with `id` by `f(event)`. Returns false if unknown.
    ///
    /// `f` must keep start and title, so the ordering is unchanged.
    pub fn update<F>(&mut self, id: &str, f: F) -> bool
    where
        F: Fn(&Event) -> Event,
    {
        let Some(current) = self.by_id.get(id) else {
            return false;
        };
        let updated = f(current);
        if let Some(slot) = self.ordered.iter_mut().find(|e| e.id() == id) {
            *slot = updated.clone();
        }
        self.by_id.insert(id.to_string(), updated);
        true
    }

    /// Events starting on `day` in `tz`, in order.
    pub fn events_on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Vec<Event> {
        self.ordered
            .iter()
            .filter(|e| e.starts_on(day, tz))
            .cloned()
            .collect()
    }
}
