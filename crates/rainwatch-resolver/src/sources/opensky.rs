//! OpenSky Network state vectors.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rainwatch_core::{with_retry, RetryConfig};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::fleet::{self, Sighting};
use super::{http_client, LocationSource};
use crate::error::SourceError;
use crate::types::{Coordinates, LocationObservation, SourceKind};

const AIRBORNE_WINDOW_SECS: i64 = 600;
const GROUNDED_WINDOW_SECS: i64 = 1200;
const METERS_TO_FEET: f64 = 3.28084;

// State vector indices
const ICAO24: usize = 0;
const CALLSIGN: usize = 1;
const TIME_POSITION: usize = 3;
const LAST_CONTACT: usize = 4;
const LONGITUDE: usize = 5;
const LATITUDE: usize = 6;
const BARO_ALTITUDE: usize = 7;
const ON_GROUND: usize = 8;

#[derive(Debug, Deserialize)]
struct StatesResponse {
    #[serde(default)]
    states: Option<Vec<Vec<Value>>>,
}

pub struct OpenSkySource {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl OpenSkySource {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }
}

#[async_trait]
impl LocationSource for OpenSkySource {
    fn name(&self) -> &str {
        "opensky"
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        let url = format!("{}/states/all", self.base_url);
        let icao24 = fleet::icao_list();

        let response = with_retry(&self.retry, || {
            self.client
                .get(&url)
                .query(&[("icao24", icao24.as_str())])
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!("OpenSky returned HTTP {}", status)));
        }

        let body: StatesResponse = response.json().await?;
        let states = body.states.unwrap_or_default();
        tracing::debug!("OpenSky returned {} state vectors", states.len());

        Ok(freshest(&states, now)
            .map(|s| s.into_observation(now, SourceKind::GroundTransponder.base_confidence()))
            .into_iter()
            .collect())
    }
}

/// Newest fleet sighting still inside its freshness window.
fn freshest(states: &[Vec<Value>], now: DateTime<Utc>) -> Option<Sighting> {
    states
        .iter()
        .map(Vec::as_slice)
        .filter_map(parse_state)
        .filter(|s| {
            let window = if s.is_grounded() {
                GROUNDED_WINDOW_SECS
            } else {
                AIRBORNE_WINDOW_SECS
            };
            s.age(now).num_seconds() <= window
        })
        .max_by_key(|s| s.seen_at)
}

fn parse_state(state: &[Value]) -> Option<Sighting> {
    if state.len() <= ON_GROUND {
        return None;
    }

    let airframe = state[ICAO24]
        .as_str()
        .and_then(fleet::by_icao)
        .or_else(|| state[CALLSIGN].as_str().and_then(fleet::by_tail))?;

    let timestamp = state[TIME_POSITION]
        .as_f64()
        .or_else(|| state[LAST_CONTACT].as_f64())?;
    let seen_at = DateTime::from_timestamp(timestamp as i64, 0)?;

    let coordinates = Coordinates::new(state[LATITUDE].as_f64()?, state[LONGITUDE].as_f64()?);
    if !coordinates.is_valid() {
        return None;
    }

    Some(Sighting {
        airframe,
        coordinates,
        altitude_ft: state[BARO_ALTITUDE].as_f64().map(|m| m * METERS_TO_FEET),
        reported_on_ground: state[ON_GROUND].as_bool().unwrap_or(false),
        seen_at,
    })
}
