//! adsb.fi per-aircraft lookups (unfiltered ADS-B).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rainwatch_core::{with_retry, RetryConfig};
use tokio::task::JoinSet;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::fleet::{Airframe, Sighting, FLEET};
use super::{http_client, LocationSource};
use crate::error::SourceError;
use crate::types::{Coordinates, LocationObservation};

const FRESH_WINDOW_SECS: i64 = 2400;

const STRONG_RSSI_DBM: f64 = -20.0;
const WEAK_RSSI_DBM: f64 = -40.0;
const STRONG_CONFIDENCE: f64 = 90.0;
const WEAK_CONFIDENCE: f64 = 80.0;
const UNGRADED_CONFIDENCE: u8 = 85;

/// Anything past this is an epoch timestamp rather than "seconds ago".
const EPOCH_THRESHOLD: f64 = 1.0e9;

/// The API answers either with an `ac` list (current) or a single
/// `aircraft` object (legacy).
#[derive(Debug, Deserialize)]
struct AircraftResponse {
    #[serde(default)]
    ac: Vec<AircraftRecord>,
    #[serde(default)]
    aircraft: Option<AircraftRecord>,
    /// Server time in milliseconds
    #[serde(default)]
    now: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AircraftRecord {
    lat: Option<f64>,
    lon: Option<f64>,
    /// Feet, or the string "ground"
    #[serde(default)]
    alt_baro: Option<Value>,
    #[serde(default)]
    ground: Option<bool>,
    seen_pos: Option<f64>,
    #[serde(default)]
    rssi: Option<f64>,
}

/// Ground confidence graded by received signal strength.
pub fn grounded_confidence(rssi: Option<f64>) -> u8 {
    let Some(rssi) = rssi.filter(|r| r.is_finite()) else {
        return UNGRADED_CONFIDENCE;
    };

    let clamped = rssi.clamp(WEAK_RSSI_DBM, STRONG_RSSI_DBM);
    let fraction = (clamped - WEAK_RSSI_DBM) / (STRONG_RSSI_DBM - WEAK_RSSI_DBM);
    (WEAK_CONFIDENCE + fraction * (STRONG_CONFIDENCE - WEAK_CONFIDENCE)).round() as u8
}

pub struct AdsbFiSource {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl AdsbFiSource {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }
}

type Lookup = Result<Option<(Sighting, Option<f64>)>, SourceError>;

/// Fresh sighting for one airframe. `Ok(None)` when the aircraft is not
/// currently seen or the record is unusable.
async fn lookup(
    client: &reqwest::Client,
    base_url: &str,
    retry: &RetryConfig,
    airframe: &'static Airframe,
    now: DateTime<Utc>,
) -> Lookup {
    let url = format!("{}/v1/aircraft/{}", base_url, airframe.icao24);
    let response = with_retry(retry, || client.get(&url).send()).await?;

    let status = response.status();
    if status.as_u16() == 404 {
        tracing::debug!("adsb.fi: {} not currently seen", airframe.tail);
        return Ok(None);
    }
    if !status.is_success() {
        tracing::warn!("adsb.fi: {} returned HTTP {}", url, status);
        return Ok(None);
    }

    let body: AircraftResponse = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("adsb.fi: unreadable body for {}: {}", airframe.tail, e);
            return Ok(None);
        }
    };

    Ok(parse_response(body, airframe, now))
}

/// Index of the first fresh sighting in fleet order, once every airframe
/// ahead of it has settled.
fn first_settled_sighting(results: &[Option<Lookup>]) -> Option<usize> {
    for (index, slot) in results.iter().enumerate() {
        match slot {
            None => return None,
            Some(Ok(Some(_))) => return Some(index),
            Some(_) => {}
        }
    }
    None
}

#[async_trait]
impl LocationSource for AdsbFiSource {
    fn name(&self) -> &str {
        "adsbfi"
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        let mut tasks = JoinSet::new();
        for (index, airframe) in FLEET.iter().enumerate() {
            let client = self.client.clone();
            let base_url = self.base_url.clone();
            let retry = self.retry.clone();
            tasks.spawn(async move {
                (index, lookup(&client, &base_url, &retry, airframe, now).await)
            });
        }

        let mut results: Vec<Option<Lookup>> = FLEET.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => {
                    tracing::warn!("adsb.fi: lookup task failed: {}", e);
                    continue;
                }
            }

            if first_settled_sighting(&results).is_some() {
                tasks.abort_all();
                break;
            }
        }

        let mut last_error = None;
        let mut answered = false;
        for (airframe, slot) in FLEET.iter().zip(results) {
            match slot {
                Some(Ok(Some((sighting, rssi)))) => {
                    tracing::debug!("adsb.fi: fresh sighting of {}", airframe.tail);
                    return Ok(vec![sighting.into_observation(now, grounded_confidence(rssi))]);
                }
                Some(Ok(None)) => answered = true,
                Some(Err(e)) => {
                    tracing::debug!("adsb.fi: lookup for {} failed: {}", airframe.tail, e);
                    last_error = Some(e);
                }
                None => {}
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}

fn parse_response(
    body: AircraftResponse,
    airframe: &'static Airframe,
    now: DateTime<Utc>,
) -> Option<(Sighting, Option<f64>)> {
    let server_now = body
        .now
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
        .unwrap_or(now);

    let record = body.aircraft.or_else(|| body.ac.into_iter().next())?;
    let coordinates = Coordinates::new(record.lat?, record.lon?);
    if !coordinates.is_valid() {
        return None;
    }

    let seen_pos = record.seen_pos?;
    let seen_at = if seen_pos > EPOCH_THRESHOLD {
        DateTime::from_timestamp(seen_pos as i64, 0)?
    } else {
        server_now - chrono::Duration::milliseconds((seen_pos * 1000.0) as i64)
    };

    let (altitude_ft, on_ground_marker) = match record.alt_baro {
        Some(Value::Number(n)) => (n.as_f64(), false),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("ground") => (Some(0.0), true),
        _ => (None, false),
    };

    let sighting = Sighting {
        airframe,
        coordinates,
        altitude_ft,
        reported_on_ground: on_ground_marker || record.ground.unwrap_or(false),
        seen_at,
    };

    if sighting.age(now).num_seconds() > FRESH_WINDOW_SECS {
        tracing::debug!("adsb.fi: {} sighting too old", airframe.tail);
        return None;
    }

    Some((sighting, record.rssi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn source_for(server: &MockServer) -> AdsbFiSource {
        AdsbFiSource::new(&server.uri(), Duration::from_secs(5), RetryConfig::no_retry()).unwrap()
    }

    #[test]
    fn test_grounded_confidence_grading() {
        assert_eq!(grounded_confidence(None), 85);
        assert_eq!(grounded_confidence(Some(-10.0)), 90);
        assert_eq!(grounded_confidence(Some(-20.0)), 90);
        assert_eq!(grounded_confidence(Some(-30.0)), 85);
        assert_eq!(grounded_confidence(Some(-40.0)), 80);
        assert_eq!(grounded_confidence(Some(-49.5)), 80);
        assert_eq!(grounded_confidence(Some(f64::NAN)), 85);
    }

    #[tokio::test]
    async fn test_not_seen_then_grounded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/aircraft/ae4e11"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/aircraft/ae4d8a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "now": now().timestamp_millis(),
                "ac": [{"hex": "ae4d8a", "lat": 26.68, "lon": -80.09, "alt_baro": "ground",
                        "seen_pos": 42.0, "rssi": -20.0}]
            })))
            .mount(&mock_server)
            .await;

        let observations = source_for(&mock_server).fetch(now()).await.unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].source, SourceKind::GroundTransponder);
        assert_eq!(observations[0].base_confidence(), 90);
        assert_eq!(
            observations[0].observed_at,
            now() - chrono::Duration::seconds(42)
        );
    }

    #[tokio::test]
    async fn test_legacy_shape_airborne() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/aircraft/ae4e11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "aircraft": {"lat": 38.9, "lon": -77.0, "alt_baro": 31000,
                             "seen_pos": (now().timestamp() - 60) as f64}
            })))
            .mount(&mock_server)
            .await;

        let observations = source_for(&mock_server).fetch(now()).await.unwrap();
        assert_eq!(observations[0].source, SourceKind::AirTransponder);
        assert_eq!(observations[0].base_confidence(), 95);
    }

    #[tokio::test]
    async fn test_all_missing_is_empty_not_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(4)
            .mount(&mock_server)
            .await;

        let observations = source_for(&mock_server).fetch(now()).await.unwrap();
        assert!(observations.is_empty());
    }

    #[tokio::test]
    async fn test_stale_and_server_errors_skipped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/aircraft/ae4e11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "now": now().timestamp_millis(),
                "ac": [{"lat": 38.9, "lon": -77.0, "alt_baro": 0, "seen_pos": 2500.0}]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let observations = source_for(&mock_server).fetch(now()).await.unwrap();
        assert!(observations.is_empty());
    }

    #[tokio::test]
    async fn test_slow_airframe_does_not_hold_back_sighting() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/aircraft/ae4e11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "now": now().timestamp_millis(),
                "ac": [{"lat": 38.9, "lon": -77.0, "alt_baro": 29000, "seen_pos": 5.0}]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/aircraft/aa3410"))
            .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_secs(30)))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = AdsbFiSource::new(
            &mock_server.uri(),
            Duration::from_secs(20),
            RetryConfig::no_retry(),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let observations = source.fetch(now()).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].source, SourceKind::AirTransponder);
    }

    #[test]
    fn test_first_settled_sighting_respects_fleet_order() {
        let sighting = |tail: &str| -> Lookup {
            let airframe = crate::sources::fleet::by_tail(tail).unwrap();
            Ok(Some((
                Sighting {
                    airframe,
                    coordinates: Coordinates::new(38.9, -77.0),
                    altitude_ft: Some(0.0),
                    reported_on_ground: true,
                    seen_at: now(),
                },
                None,
            )))
        };

        let pending_ahead = vec![None, Some(sighting("82-8000")), None, None];
        assert_eq!(first_settled_sighting(&pending_ahead), None);

        let settled = vec![Some(Ok(None)), Some(sighting("82-8000")), None, None];
        assert_eq!(first_settled_sighting(&settled), Some(1));

        let failed_ahead = vec![
            Some(Err(SourceError::Unavailable("timeout".into()))),
            Some(sighting("82-8000")),
            None,
            None,
        ];
        assert_eq!(first_settled_sighting(&failed_ahead), Some(1));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let source = AdsbFiSource::new(
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            RetryConfig::no_retry(),
        )
        .unwrap();

        let result = source.fetch(now()).await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }
}
