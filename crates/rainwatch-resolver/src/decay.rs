//! Confidence decay.
//!
//! Only schedule-derived observations lose confidence with age: a calendar
//! entry starts at its base confidence and slides linearly to the floor over
//! the staleness window. Every other source is flat.

use chrono::{DateTime, Duration, Utc};

use crate::types::{LocationObservation, SourceKind};

pub const STALENESS_WINDOW_HOURS: i64 = 72;

/// Calendar confidence never decays below this.
pub const CALENDAR_FLOOR: f64 = 30.0;

const CALENDAR_DECAY_SPAN: f64 = 40.0;

pub fn staleness_window() -> Duration {
    Duration::hours(STALENESS_WINDOW_HOURS)
}

/// Age in fractional hours, clamped at zero.
pub fn age_hours(observed_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let secs = (now - observed_at).num_seconds().max(0);
    secs as f64 / 3600.0
}

/// Older than the staleness window.
pub fn is_stale(observed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - observed_at > staleness_window()
}

/// Effective confidence for `source` given its base confidence and age.
pub fn decay(
    source: SourceKind,
    base_confidence: u8,
    observed_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let base = f64::from(base_confidence);

    match source {
        SourceKind::CalendarEvent => {
            let window = STALENESS_WINDOW_HOURS as f64;
            let hours = age_hours(observed_at, now).min(window);
            let decayed = base - (CALENDAR_DECAY_SPAN / window) * hours;
            decayed.max(CALENDAR_FLOOR.min(base))
        }
        _ => base,
    }
}

pub fn effective_confidence(observation: &LocationObservation, now: DateTime<Utc>) -> f64 {
    decay(
        observation.source,
        observation.base_confidence(),
        observation.observed_at,
        now,
    )
}
