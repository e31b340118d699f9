//! In-process TTL cache for the parsed schedule feed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::types::ScheduleEvent;

/// Holds the last successfully parsed feed for `ttl`.
#[derive(Debug)]
pub struct FeedCache {
    ttl: Duration,
    entry: Mutex<Option<(Instant, Arc<Vec<ScheduleEvent>>)>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Cached events, if still fresh.
    pub fn get(&self) -> Option<Arc<Vec<ScheduleEvent>>> {
        let entry = self.entry.lock();
        match entry.as_ref() {
            Some((stored_at, events)) if stored_at.elapsed() < self.ttl => Some(events.clone()),
            _ => None,
        }
    }

    pub fn put(&self, events: Vec<ScheduleEvent>) -> Arc<Vec<ScheduleEvent>> {
        let events = Arc::new(events);
        *self.entry.lock() = Some((Instant::now(), events.clone()));
        events
    }
}
