//! JSON answer to "is it raining where the subject is?".

use chrono::{DateTime, Utc};
use rainwatch_weather::{ThunderstormState, WeatherLookup};
use serde::Serialize;

use crate::error::ResolveError;
use crate::types::{ResolutionResult, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Location and weather both known
    Known,
    /// Subject is airborne; always reported dry
    InFlight,
    /// No location could be resolved
    Unknown,
    /// Location known, weather lookup failed
    WeatherUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportCoords {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainReport {
    pub precipitating: Option<bool>,
    pub mmh: Option<f64>,
    pub thunderstorm: Option<bool>,
    pub thunderstorm_state: Option<ThunderstormState>,
    /// Human label for the WMO weather code
    pub condition: Option<String>,
    pub coords: Option<ReportCoords>,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    pub confidence: Option<u8>,
    pub source: Option<SourceKind>,
    pub is_stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RainReport {
    /// Report for an unresolved location.
    pub fn unknown(now: DateTime<Utc>, reason: &ResolveError) -> Self {
        Self {
            precipitating: None,
            mmh: None,
            thunderstorm: None,
            thunderstorm_state: None,
            condition: None,
            coords: None,
            timestamp: now,
            status: ReportStatus::Unknown,
            confidence: None,
            source: None,
            is_stale: false,
            error: Some(reason.user_message().to_string()),
        }
    }

    /// Build the report for a resolution outcome. The weather collaborator
    /// is not consulted when the location is unknown or the subject is
    /// airborne.
    pub async fn build(
        resolution: &Result<ResolutionResult, ResolveError>,
        weather: &dyn WeatherLookup,
        now: DateTime<Utc>,
    ) -> Self {
        let resolved = match resolution {
            Ok(resolved) => resolved,
            Err(e) => return Self::unknown(now, e),
        };

        let best = &resolved.best;
        let coordinates = best.coordinates();
        let mut report = Self {
            precipitating: None,
            mmh: None,
            thunderstorm: None,
            thunderstorm_state: None,
            condition: None,
            coords: Some(ReportCoords {
                lat: coordinates.lat,
                lon: coordinates.lon,
                name: best.place_name().map(str::to_string),
            }),
            timestamp: now,
            status: ReportStatus::Known,
            confidence: Some(best.effective_confidence.round().clamp(0.0, 100.0) as u8),
            source: Some(best.source()),
            is_stale: resolved.is_stale,
            error: None,
        };

        if resolved.is_airborne() {
            report.status = ReportStatus::InFlight;
            report.precipitating = Some(false);
            report.mmh = Some(0.0);
            report.thunderstorm = Some(false);
            report.thunderstorm_state = Some(ThunderstormState::None);
            return report;
        }

        match weather.query(coordinates.lat, coordinates.lon).await {
            Ok(reading) => {
                let storm = reading.thunderstorm();
                report.precipitating = Some(reading.is_precipitating());
                report.mmh = Some(reading.precipitation_mmh);
                report.thunderstorm = Some(storm.is_active());
                report.thunderstorm_state = Some(storm);
                report.condition = Some(reading.condition().description().to_string());
            }
            Err(e) => {
                tracing::warn!("Weather lookup failed: {}", e);
                report.status = ReportStatus::WeatherUnavailable;
                report.error = Some(e.user_message().to_string());
            }
        }

        report
    }
}
