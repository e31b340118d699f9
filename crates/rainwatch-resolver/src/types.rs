//! Observation and resolution data model.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    AirTransponder,
    GroundTransponder,
    OvernightInference,
    CalendarEvent,
    NewswireGeocode,
    LastArrivalCache,
}

impl SourceKind {
    /// Confidence an adapter assigns when it has nothing better to go on.
    pub fn base_confidence(&self) -> u8 {
        match self {
            Self::AirTransponder => 95,
            Self::GroundTransponder => 85,
            Self::OvernightInference => 58,
            Self::CalendarEvent => 70,
            Self::NewswireGeocode => 35,
            Self::LastArrivalCache => 30,
        }
    }

    /// Last-resort tie-break rank; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            Self::AirTransponder => 6,
            Self::GroundTransponder => 5,
            Self::OvernightInference => 4,
            Self::CalendarEvent => 3,
            Self::NewswireGeocode => 2,
            Self::LastArrivalCache => 1,
        }
    }

    pub fn is_transponder(&self) -> bool {
        matches!(self, Self::AirTransponder | Self::GroundTransponder)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AirTransponder => "air transponder",
            Self::GroundTransponder => "ground transponder",
            Self::OvernightInference => "overnight inference",
            Self::CalendarEvent => "calendar event",
            Self::NewswireGeocode => "newswire geocode",
            Self::LastArrivalCache => "last arrival",
        };
        f.write_str(label)
    }
}

/// WGS84 point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Aircraft telemetry attached to transponder sightings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    /// Tail number / callsign from the fleet table
    pub tail: String,
    pub icao24: String,
    pub altitude_ft: Option<f64>,
    pub airborne: bool,
}

/// One sighting from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationObservation {
    pub source: SourceKind,
    pub coordinates: Coordinates,
    pub place_name: Option<String>,
    pub observed_at: DateTime<Utc>,
    base_confidence: u8,
    pub flight: Option<FlightInfo>,
}

impl LocationObservation {
    /// New observation carrying the source's default confidence.
    pub fn new(source: SourceKind, coordinates: Coordinates, observed_at: DateTime<Utc>) -> Self {
        Self {
            source,
            coordinates,
            place_name: None,
            observed_at,
            base_confidence: source.base_confidence(),
            flight: None,
        }
    }

    pub fn with_place_name(mut self, name: impl Into<String>) -> Self {
        self.place_name = Some(name.into());
        self
    }

    /// Override the default confidence; values above 100 are clamped.
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.base_confidence = confidence.min(100);
        self
    }

    pub fn with_flight(mut self, flight: FlightInfo) -> Self {
        self.flight = Some(flight);
        self
    }

    pub fn base_confidence(&self) -> u8 {
        self.base_confidence
    }

    /// Age at `now`; negative ages count as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.observed_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Airborne means an air-transponder fix whose telemetry, if any, agrees.
    pub fn is_airborne(&self) -> bool {
        self.source == SourceKind::AirTransponder
            && self.flight.as_ref().map_or(true, |f| f.airborne)
    }
}

/// A candidate after decay has been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEstimate {
    pub observation: LocationObservation,
    pub effective_confidence: f64,
    pub age_at_resolution: Duration,
}

impl RankedEstimate {
    pub fn coordinates(&self) -> Coordinates {
        self.observation.coordinates
    }

    pub fn place_name(&self) -> Option<&str> {
        self.observation.place_name.as_deref()
    }

    pub fn source(&self) -> SourceKind {
        self.observation.source
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observation.observed_at
    }
}

/// What happened to one adapter during a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SourceOutcome {
    Returned { count: usize },
    Failed { reason: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn answered(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Returned { .. })
    }
}

/// Output of one resolver run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    pub best: RankedEstimate,
    /// Every candidate considered, best first
    pub candidates: Vec<RankedEstimate>,
    /// No candidate was younger than the staleness window
    pub is_stale: bool,
    pub sources: Vec<SourceReport>,
    pub resolved_at: DateTime<Utc>,
}

impl ResolutionResult {
    pub fn is_airborne(&self) -> bool {
        self.best.observation.is_airborne()
    }
}
