//! Known overnight regions and great-circle matching.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};

use crate::types::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point belongs to a region within this distance of its centre.
pub const REGION_RADIUS_KM: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    DcMetro,
    Florida,
    NewJersey,
}

#[derive(Debug)]
pub struct RegionInfo {
    pub region: Region,
    pub center: Coordinates,
    /// Where an overnight stay in this region is placed
    pub anchor: Coordinates,
    pub anchor_name: &'static str,
    /// Eastern calendar months (1-12) during which the region is used
    pub months: Option<(u32, u32)>,
}

static REGIONS: [RegionInfo; 3] = [
    RegionInfo {
        region: Region::DcMetro,
        center: Coordinates::new(38.9072, -77.0369),
        anchor: Coordinates::new(38.897676, -77.036529),
        anchor_name: "The White House",
        months: None,
    },
    RegionInfo {
        region: Region::Florida,
        center: Coordinates::new(26.6758, -80.0364),
        anchor: Coordinates::new(26.6758, -80.0364),
        anchor_name: "Mar-a-Lago",
        months: None,
    },
    RegionInfo {
        region: Region::NewJersey,
        center: Coordinates::new(40.6456, -74.6392),
        anchor: Coordinates::new(40.645560, -74.639170),
        anchor_name: "Trump Nat'l Golf Club Bedminster",
        // Summer residence only
        months: Some((5, 10)),
    },
];

impl Region {
    pub fn info(&self) -> &'static RegionInfo {
        match self {
            Self::DcMetro => &REGIONS[0],
            Self::Florida => &REGIONS[1],
            Self::NewJersey => &REGIONS[2],
        }
    }

    /// Whether the region can be matched at `now` (Eastern month).
    pub fn in_season(&self, now: DateTime<Utc>) -> bool {
        match self.info().months {
            None => true,
            Some((first, last)) => {
                let month = now.with_timezone(&New_York).month();
                (first..=last).contains(&month)
            }
        }
    }
}

pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Nearest in-season region whose centre lies within the radius of `point`.
pub fn region_for(point: Coordinates, now: DateTime<Utc>) -> Option<Region> {
    REGIONS
        .iter()
        .filter(|info| info.region.in_season(now))
        .map(|info| (info.region, haversine_km(point, info.center)))
        .filter(|(_, distance)| *distance <= REGION_RADIUS_KM)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(region, _)| region)
}
