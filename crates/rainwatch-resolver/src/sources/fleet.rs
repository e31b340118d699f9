//! Tracked airframes and the sighting shape shared by transponder feeds.

use chrono::{DateTime, Duration, Utc};

use crate::types::{Coordinates, FlightInfo, LocationObservation, SourceKind};

/// Below this barometric altitude an aircraft counts as on the ground.
pub const GROUND_ALTITUDE_FT: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirframeRole {
    /// VC-25A (Air Force One)
    Vc25a,
    /// C-32A (smaller Air Force One)
    C32a,
    Private,
}

#[derive(Debug, Clone, Copy)]
pub struct Airframe {
    pub tail: &'static str,
    /// ICAO 24-bit address, lower-case hex
    pub icao24: &'static str,
    pub role: AirframeRole,
}

pub static FLEET: &[Airframe] = &[
    Airframe {
        tail: "92-9000",
        icao24: "ae4e11",
        role: AirframeRole::Vc25a,
    },
    Airframe {
        tail: "82-8000",
        icao24: "ae4d8a",
        role: AirframeRole::Vc25a,
    },
    Airframe {
        tail: "98-0001",
        icao24: "ae6053",
        role: AirframeRole::C32a,
    },
    Airframe {
        tail: "N757AF",
        icao24: "aa3410",
        role: AirframeRole::Private,
    },
];

pub fn by_icao(icao24: &str) -> Option<&'static Airframe> {
    let icao24 = icao24.trim();
    FLEET.iter().find(|a| a.icao24.eq_ignore_ascii_case(icao24))
}

pub fn by_tail(tail: &str) -> Option<&'static Airframe> {
    let tail = tail.trim();
    FLEET.iter().find(|a| a.tail.eq_ignore_ascii_case(tail))
}

/// Comma-separated ICAO list for bulk queries.
pub fn icao_list() -> String {
    FLEET
        .iter()
        .map(|a| a.icao24)
        .collect::<Vec<_>>()
        .join(",")
}

/// One position report for a fleet aircraft.
#[derive(Debug, Clone)]
pub struct Sighting {
    pub airframe: &'static Airframe,
    pub coordinates: Coordinates,
    pub altitude_ft: Option<f64>,
    pub reported_on_ground: bool,
    pub seen_at: DateTime<Utc>,
}

impl Sighting {
    pub fn is_grounded(&self) -> bool {
        self.reported_on_ground || self.altitude_ft.unwrap_or(0.0) < GROUND_ALTITUDE_FT
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.seen_at
    }

    /// Convert to an observation. Clock skew never yields a future timestamp.
    pub fn into_observation(self, now: DateTime<Utc>, ground_confidence: u8) -> LocationObservation {
        let grounded = self.is_grounded();
        let (source, state) = if grounded {
            (SourceKind::GroundTransponder, "on ground")
        } else {
            (SourceKind::AirTransponder, "airborne")
        };

        let observation = LocationObservation::new(source, self.coordinates, self.seen_at.min(now))
            .with_place_name(format!("Aircraft {} ({})", self.airframe.tail, state))
            .with_flight(FlightInfo {
                tail: self.airframe.tail.to_string(),
                icao24: self.airframe.icao24.to_string(),
                altitude_ft: self.altitude_ft,
                airborne: !grounded,
            });

        if grounded {
            observation.with_confidence(ground_confidence)
        } else {
            observation
        }
    }
}
