//! Public schedule entries resolved through the place-alias table.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rainwatch_calendar::{CalendarClient, ScheduleEvent};
use tracing::instrument;

use super::{place_aliases, LocationSource};
use crate::error::SourceError;
use crate::types::{LocationObservation, SourceKind};

pub struct CalendarSource {
    client: CalendarClient,
    lookback: Duration,
    lookahead: Duration,
}

impl CalendarSource {
    pub fn new(client: CalendarClient, lookback_hours: u32, lookahead_hours: u32) -> Self {
        Self {
            client,
            lookback: Duration::hours(i64::from(lookback_hours)),
            lookahead: Duration::hours(i64::from(lookahead_hours)),
        }
    }
}

/// Observation for an event whose location names a known place.
///
/// Future events are returned as-is; the resolver only uses them as
/// overnight hints.
pub fn observation_for(event: &ScheduleEvent) -> Option<LocationObservation> {
    let alias = event
        .location_hint()
        .and_then(place_aliases::lookup)
        .or_else(|| place_aliases::lookup(&event.summary))?;

    Some(
        LocationObservation::new(SourceKind::CalendarEvent, alias.coordinates, event.start_utc)
            .with_place_name(alias.name),
    )
}

#[async_trait]
impl LocationSource for CalendarSource {
    fn name(&self) -> &str {
        "calendar"
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        let events = self
            .client
            .events_between(now - self.lookback, now + self.lookahead)
            .await?;

        let observations: Vec<_> = events
            .iter()
            .filter_map(|event| {
                let observation = observation_for(event);
                if observation.is_none() && event.has_effective_location() {
                    tracing::debug!("Unresolved schedule location: {:?}", event.location_hint());
                }
                observation
            })
            .collect();

        tracing::debug!(
            "Calendar: {} of {} entries resolved to a place",
            observations.len(),
            events.len()
        );
        Ok(observations)
    }
}
