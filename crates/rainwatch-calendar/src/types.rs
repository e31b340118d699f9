//! Schedule feed types.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Placeholder entries published on days without a public schedule.
const NO_PUBLIC_EVENTS_PREFIX: &str = "the president has no public events";

/// Summaries that imply a location even when the location field is empty.
const IMPLICIT_LOCATION_SUMMARIES: &[&str] = &["in-town pool call time"];

/// Raw feed entry as published.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedItem {
    /// Local (Eastern) date, e.g. "2025-05-30"
    pub date: String,
    /// Local (Eastern) time, e.g. "14:00:00"; absent for all-day entries
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl FeedItem {
    pub fn summary(&self) -> &str {
        self.details.as_deref().unwrap_or("").trim()
    }

    pub fn is_placeholder(&self) -> bool {
        self.summary()
            .to_lowercase()
            .starts_with(NO_PUBLIC_EVENTS_PREFIX)
    }

    /// Start instant in UTC. Feed times are America/New_York wall-clock.
    pub fn start_utc(&self) -> Result<DateTime<Utc>, CalendarError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|e| CalendarError::InvalidFeed(format!("bad date {:?}: {}", self.date, e)))?;

        let time = match self.time.as_deref().map(str::trim) {
            None | Some("") => NaiveTime::MIN,
            Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
                .map_err(|e| CalendarError::InvalidFeed(format!("bad time {:?}: {}", raw, e)))?,
        };

        let local = date.and_time(time);
        New_York
            .from_local_datetime(&local)
            .earliest()
            // Wall-clock times skipped by the spring DST jump resolve an hour later.
            .or_else(|| {
                New_York
                    .from_local_datetime(&(local + chrono::Duration::hours(1)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| CalendarError::InvalidFeed(format!("unrepresentable time {}", local)))
    }
}

/// A normalised schedule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub start_utc: DateTime<Utc>,
    pub summary: String,
    /// Trimmed location field; `None` when the feed left it empty
    pub location: Option<String>,
}

impl ScheduleEvent {
    /// Normalise a feed item. Placeholder entries yield `Ok(None)`.
    pub fn from_item(item: &FeedItem) -> Result<Option<Self>, CalendarError> {
        if item.is_placeholder() {
            return Ok(None);
        }

        let location = item
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        Ok(Some(Self {
            start_utc: item.start_utc()?,
            summary: item.summary().to_string(),
            location,
        }))
    }

    /// True if the event names a place, explicitly or through its summary.
    pub fn has_effective_location(&self) -> bool {
        self.location_hint().is_some()
    }

    /// Text to resolve into coordinates: the location field, else an
    /// implicit-location summary.
    pub fn location_hint(&self) -> Option<&str> {
        if let Some(location) = self.location.as_deref() {
            return Some(location);
        }
        let summary = self.summary.to_lowercase();
        if IMPLICIT_LOCATION_SUMMARIES
            .iter()
            .any(|pattern| summary.contains(pattern))
        {
            Some(self.summary.as_str())
        } else {
            None
        }
    }
}

/// Parse a full feed body. Individual bad entries are skipped; a body that is
/// not a list, or in which every entry is unusable, is an error.
pub fn parse_feed(body: &str) -> Result<Vec<ScheduleEvent>, CalendarError> {
    let items: Vec<FeedItem> = serde_json::from_str(body)
        .map_err(|e| CalendarError::InvalidFeed(format!("JSON parse error: {}", e)))?;

    let mut events = Vec::with_capacity(items.len());
    let mut rejected = 0usize;

    for item in &items {
        match ScheduleEvent::from_item(item) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => {
                rejected += 1;
                tracing::debug!("Skipping feed item: {}", e);
            }
        }
    }

    if rejected > 0 && rejected == items.len() {
        return Err(CalendarError::InvalidFeed(format!(
            "all {} feed entries were unparseable",
            rejected
        )));
    }

    events.sort_by_key(|e| e.start_utc);
    Ok(events)
}
