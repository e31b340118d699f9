//! Overnight inference.
//!
//! Between 21:00 and 08:00 Eastern the schedule usually has a gap. When the
//! last event before the night and the first event after it fall in the same
//! region, the night was almost certainly spent at that region's residence.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::America::New_York;

use crate::region::region_for;
use crate::types::{LocationObservation, SourceKind};

pub const OVERNIGHT_CONFIDENCE: u8 = 58;

const WINDOW_START_HOUR: u32 = 21;
const WINDOW_END_HOUR: u32 = 8;

/// True between 21:00 and 08:00 New York time.
pub fn in_overnight_window(now: DateTime<Utc>) -> bool {
    let hour = now.with_timezone(&New_York).hour();
    hour >= WINDOW_START_HOUR || hour < WINDOW_END_HOUR
}

/// 21:00 Eastern of the current overnight: today if it is already past 21:00
/// locally, otherwise yesterday.
pub fn window_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let local = now.with_timezone(&New_York);
    let date = if local.hour() >= WINDOW_START_HOUR {
        local.date_naive()
    } else {
        local.date_naive() - Duration::days(1)
    };

    let start = NaiveTime::from_hms_opt(WINDOW_START_HOUR, 0, 0)?;
    New_York
        .from_local_datetime(&date.and_time(start))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Synthesize an overnight observation from calendar observations, if the
/// evening and morning events agree on a region.
pub fn infer(observations: &[LocationObservation], now: DateTime<Utc>) -> Option<LocationObservation> {
    if !in_overnight_window(now) {
        return None;
    }
    let start = window_start(now)?;

    let calendar = || {
        observations
            .iter()
            .filter(|o| o.source == SourceKind::CalendarEvent)
    };

    let evening = calendar()
        .filter(|o| o.observed_at < start)
        .max_by_key(|o| o.observed_at)?;
    let morning = calendar()
        .filter(|o| o.observed_at > start)
        .min_by_key(|o| o.observed_at)?;

    let evening_region = region_for(evening.coordinates, now)?;
    let morning_region = region_for(morning.coordinates, now)?;

    if evening_region != morning_region {
        tracing::debug!(
            "Overnight: evening in {:?}, morning in {:?}; no inference",
            evening_region,
            morning_region
        );
        return None;
    }

    let info = evening_region.info();
    tracing::info!("Overnight inference: {}", info.anchor_name);

    Some(
        LocationObservation::new(SourceKind::OvernightInference, info.anchor, now)
            .with_place_name(info.anchor_name)
            .with_confidence(OVERNIGHT_CONFIDENCE),
    )
}
