//! Integration tests for the resolver using stub location sources.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use rainwatch_calendar::CalendarClient;
use rainwatch_core::{CalendarConfig, RetryConfig};
use rainwatch_resolver::sources::CalendarSource;
use rainwatch_resolver::{
    Coordinates, LocationObservation, LocationSource, RainReport, ReportStatus, ResolveError,
    Resolver, SourceError, SourceKind, SourceOutcome,
};
use rainwatch_weather::{WeatherLookup, WeatherProvider};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WHITE_HOUSE: Coordinates = Coordinates::new(38.897676, -77.036529);
const ANDREWS: Coordinates = Coordinates::new(38.810830, -76.866940);
const MAR_A_LAGO: Coordinates = Coordinates::new(26.6758, -80.0364);
const BEDMINSTER: Coordinates = Coordinates::new(40.645560, -74.639170);

/// Source returning a fixed set of observations
struct Fixed {
    name: &'static str,
    observations: Vec<LocationObservation>,
}

#[async_trait]
impl LocationSource for Fixed {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        Ok(self.observations.clone())
    }
}

/// Source that always fails
struct Broken(&'static str);

#[async_trait]
impl LocationSource for Broken {
    fn name(&self) -> &str {
        self.0
    }

    async fn fetch(&self, _now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        Err(SourceError::Unavailable("connection refused".into()))
    }
}

/// Source that never answers in time
struct Slow;

#[async_trait]
impl LocationSource for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![LocationObservation::new(
            SourceKind::AirTransponder,
            MAR_A_LAGO,
            now,
        )])
    }
}

fn fixed(name: &'static str, observations: Vec<LocationObservation>) -> Arc<dyn LocationSource> {
    Arc::new(Fixed { name, observations })
}

fn resolver() -> Resolver {
    Resolver::new(Duration::from_secs(5), Duration::from_secs(10))
}

fn eastern(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    New_York
        .with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn calendar(at: DateTime<Utc>, point: Coordinates) -> LocationObservation {
    LocationObservation::new(SourceKind::CalendarEvent, point, at)
}

#[tokio::test]
async fn test_overnight_same_region_adds_white_house() {
    let now = eastern(2025, 6, 2, 2);
    let resolver = resolver().with_source(fixed(
        "calendar",
        vec![
            calendar(eastern(2025, 6, 1, 18), ANDREWS),
            calendar(eastern(2025, 6, 2, 10), WHITE_HOUSE),
        ],
    ));

    let result = resolver.resolve(now).await.unwrap();

    let overnight: Vec<_> = result
        .candidates
        .iter()
        .filter(|c| c.source() == SourceKind::OvernightInference)
        .collect();
    assert_eq!(overnight.len(), 1);
    assert_eq!(overnight[0].coordinates(), WHITE_HOUSE);
    assert_eq!(overnight[0].effective_confidence, 58.0);

    // The future morning event is a hint only
    assert!(result.candidates.iter().all(|c| c.observed_at() <= now));
}

#[tokio::test]
async fn test_overnight_different_regions_adds_nothing() {
    let now = eastern(2025, 6, 2, 2);
    let resolver = resolver().with_source(fixed(
        "calendar",
        vec![
            calendar(eastern(2025, 6, 1, 18), WHITE_HOUSE),
            calendar(eastern(2025, 6, 2, 10), MAR_A_LAGO),
        ],
    ));

    let result = resolver.resolve(now).await.unwrap();
    assert!(result
        .candidates
        .iter()
        .all(|c| c.source() != SourceKind::OvernightInference));
    assert_eq!(result.best.source(), SourceKind::CalendarEvent);
}

#[tokio::test]
async fn test_bedminster_ignored_in_january() {
    let now = eastern(2025, 1, 12, 1);
    let resolver = resolver().with_source(fixed(
        "calendar",
        vec![
            calendar(eastern(2025, 1, 11, 18), BEDMINSTER),
            calendar(eastern(2025, 1, 12, 10), BEDMINSTER),
        ],
    ));

    let result = resolver.resolve(now).await.unwrap();
    assert!(result
        .candidates
        .iter()
        .all(|c| c.source() != SourceKind::OvernightInference));
}

#[tokio::test]
async fn test_air_transponder_beats_decayed_calendar() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
    let resolver = resolver()
        .with_source(fixed(
            "calendar",
            vec![calendar(now - chrono::Duration::hours(36), WHITE_HOUSE)],
        ))
        .with_source(fixed(
            "opensky",
            vec![LocationObservation::new(SourceKind::AirTransponder, MAR_A_LAGO, now)],
        ));

    let result = resolver.resolve(now).await.unwrap();
    assert_eq!(result.best.source(), SourceKind::AirTransponder);
    assert_eq!(result.best.effective_confidence, 95.0);
    assert!((result.candidates[1].effective_confidence - 50.0).abs() < 1e-9);
    assert!(result.is_airborne());
}

#[tokio::test]
async fn test_equal_confidence_most_recent_wins() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
    let earlier = LocationObservation::new(
        SourceKind::NewswireGeocode,
        WHITE_HOUSE,
        now - chrono::Duration::hours(3),
    );
    let later = LocationObservation::new(
        SourceKind::NewswireGeocode,
        MAR_A_LAGO,
        now - chrono::Duration::hours(1),
    );
    let resolver = resolver().with_source(fixed("newswire", vec![earlier, later]));

    let result = resolver.resolve(now).await.unwrap();
    assert_eq!(result.best.coordinates(), MAR_A_LAGO);
}

#[tokio::test]
async fn test_nothing_found_is_no_location() {
    let now = Utc::now();
    let resolver = resolver()
        .with_source(fixed("calendar", Vec::new()))
        .with_source(fixed("last_arrival", Vec::new()))
        .with_source(Arc::new(Broken("opensky")));

    let err = resolver.resolve(now).await.unwrap_err();
    assert_eq!(err, ResolveError::NoLocationAvailable);
}

#[tokio::test]
async fn test_every_source_failing_is_source_unavailable() {
    let resolver = resolver()
        .with_source(Arc::new(Broken("opensky")))
        .with_source(Arc::new(Broken("adsbfi")));

    let err = resolver.resolve(Utc::now()).await.unwrap_err();
    assert_eq!(err, ResolveError::SourceUnavailable);
}

#[tokio::test]
async fn test_only_old_calendar_is_stale() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
    let resolver = resolver().with_source(fixed(
        "calendar",
        vec![calendar(now - chrono::Duration::hours(100), WHITE_HOUSE)],
    ));

    let result = resolver.resolve(now).await.unwrap();
    assert!(result.is_stale);
    assert_eq!(result.best.effective_confidence, 30.0);
    assert_eq!(
        result.best.age_at_resolution,
        Duration::from_secs(100 * 3600)
    );
}

#[tokio::test]
async fn test_slow_source_cut_off_by_budget() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
    let resolver = Resolver::new(Duration::from_secs(20), Duration::from_millis(300))
        .with_source(Arc::new(Slow))
        .with_source(fixed(
            "last_arrival",
            vec![LocationObservation::new(
                SourceKind::LastArrivalCache,
                ANDREWS,
                now - chrono::Duration::hours(4),
            )],
        ));

    let started = std::time::Instant::now();
    let result = resolver.resolve(now).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(result.best.source(), SourceKind::LastArrivalCache);
    let slow = result.sources.iter().find(|r| r.name == "slow").unwrap();
    assert_eq!(slow.outcome, SourceOutcome::TimedOut);
}

#[tokio::test]
async fn test_adapter_timeout_reported() {
    let now = Utc::now();
    let resolver = Resolver::new(Duration::from_millis(100), Duration::from_secs(5))
        .with_source(Arc::new(Slow))
        .with_source(fixed(
            "newswire",
            vec![LocationObservation::new(SourceKind::NewswireGeocode, WHITE_HOUSE, now)],
        ));

    let result = resolver.resolve(now).await.unwrap();
    assert_eq!(result.sources[0].outcome, SourceOutcome::TimedOut);
    assert_eq!(result.sources[1].outcome, SourceOutcome::Returned { count: 1 });
}

#[tokio::test]
async fn test_airborne_winner_reports_dry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current": {"precipitation": 4.0, "weather_code": 63}
        })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let weather = WeatherProvider::new(
        &mock_server.uri(),
        Duration::from_secs(5),
        Duration::from_secs(300),
        RetryConfig::no_retry(),
    )
    .unwrap();

    let now = Utc::now();
    let resolver = resolver().with_source(fixed(
        "opensky",
        vec![LocationObservation::new(SourceKind::AirTransponder, WHITE_HOUSE, now)],
    ));

    let resolution = resolver.resolve(now).await;
    let report = RainReport::build(&resolution, &weather as &dyn WeatherLookup, now).await;

    assert_eq!(report.status, ReportStatus::InFlight);
    assert_eq!(report.precipitating, Some(false));
}

#[tokio::test]
async fn test_calendar_feed_to_rain_report() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar-full.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"date": "2025-06-01", "time": "10:00:00", "details": "Receives intelligence briefing", "location": "Oval Office"},
            {"date": "2025-06-01", "time": "15:00:00", "details": "Remarks", "location": "Rose Garden"}
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current": {"precipitation": 1.3, "weather_code": 95}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CalendarClient::new(
        &format!("{}/calendar-full.json", mock_server.uri()),
        Duration::from_secs(5),
        Duration::from_secs(900),
        RetryConfig::no_retry(),
    )
    .unwrap();
    let weather = WeatherProvider::new(
        &format!("{}/v1/forecast", mock_server.uri()),
        Duration::from_secs(5),
        Duration::from_secs(300),
        RetryConfig::no_retry(),
    )
    .unwrap();

    // 12:00 Eastern, after the briefing and before the remarks
    let now = eastern(2025, 6, 1, 12);
    let resolver = resolver().with_source(Arc::new(CalendarSource::new(client, 96, 18)));

    let resolution = resolver.resolve(now).await;
    let result = resolution.as_ref().unwrap();
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.best.place_name(), Some("Oval Office, WH"));

    let report = RainReport::build(&resolution, &weather, now).await;
    assert_eq!(report.status, ReportStatus::Known);
    assert_eq!(report.precipitating, Some(true));
    assert_eq!(report.thunderstorm, Some(true));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["thunderstorm_state"], "moderate");
    assert_eq!(json["coords"]["name"], "Oval Office, WH");
}

#[tokio::test]
async fn test_schedule_inside_lookback_backs_stale_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar-full.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"date": "2025-05-27", "time": "20:00:00", "details": "Dinner", "location": "Rose Garden"},
            {"date": "2025-05-29", "time": "10:00:00", "details": "Bill signing", "location": "Oval Office"}
        ])))
        .mount(&mock_server)
        .await;

    let client = CalendarClient::new(
        &format!("{}/calendar-full.json", mock_server.uri()),
        Duration::from_secs(5),
        Duration::from_secs(900),
        RetryConfig::no_retry(),
    )
    .unwrap();
    let window = CalendarConfig::default();

    // 74 h after the signing; the dinner is past the lookback
    let now = eastern(2025, 6, 1, 12);
    let resolver = resolver().with_source(Arc::new(CalendarSource::new(
        client,
        window.lookback_hours,
        window.lookahead_hours,
    )));

    let result = resolver.resolve(now).await.unwrap();
    assert!(result.is_stale);
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.best.place_name(), Some("Oval Office, WH"));
    assert_eq!(result.best.effective_confidence, 30.0);
}
