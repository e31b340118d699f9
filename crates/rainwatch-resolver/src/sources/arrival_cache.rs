//! Last confirmed aircraft arrival, persisted as a small JSON file.
//!
//! The landing-detection path writes it; the resolver only reads it.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::LocationSource;
use crate::error::SourceError;
use crate::types::{Coordinates, LocationObservation, ResolutionResult, SourceKind};

pub const FILE_NAME: &str = "last_arrival.json";
pub const MAX_AGE_DAYS: i64 = 7;

const DEFAULT_LABEL: &str = "Last known (jet arrival)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalRecord {
    pub lat: f64,
    pub lon: f64,
    pub ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArrivalCache {
    path: PathBuf,
}

impl ArrivalCache {
    /// Cache file inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored arrival as an observation, if one exists and is recent.
    /// Missing, unreadable, or expired files all read as empty.
    pub fn read(&self, now: DateTime<Utc>) -> Option<LocationObservation> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };

        let record: ArrivalRecord = match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Ignoring corrupt arrival cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        if now - record.ts > Duration::days(MAX_AGE_DAYS) {
            tracing::debug!("Arrival cache entry from {} has expired", record.ts);
            return None;
        }

        let coordinates = Coordinates::new(record.lat, record.lon);
        if !coordinates.is_valid() {
            tracing::warn!("Arrival cache holds invalid coordinates");
            return None;
        }

        let label = record.name.unwrap_or_else(|| DEFAULT_LABEL.to_string());
        Some(
            LocationObservation::new(SourceKind::LastArrivalCache, coordinates, record.ts.min(now))
                .with_place_name(label),
        )
    }

    /// Persist an arrival. Written to a temporary file then renamed into place.
    pub fn save(
        &self,
        coordinates: Coordinates,
        ts: DateTime<Utc>,
        name: Option<&str>,
    ) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let record = ArrivalRecord {
            lat: coordinates.lat,
            lon: coordinates.lon,
            ts,
            name: name.map(str::to_string),
        };
        let json = serde_json::to_string(&record).map_err(io::Error::other)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::info!(
            "Saved arrival ({:.4}, {:.4}) at {}",
            record.lat,
            record.lon,
            record.ts
        );
        Ok(())
    }

    /// Remember where the aircraft landed when the winning estimate is a
    /// ground transponder fix. Returns whether an arrival was written.
    ///
    /// The aircraft label is not stored; cache hits carry the generic
    /// last-arrival label so they are never mistaken for a live fix.
    pub fn record_landing(&self, result: &ResolutionResult) -> io::Result<bool> {
        let best = &result.best;
        if best.source() != SourceKind::GroundTransponder {
            return Ok(false);
        }

        self.save(best.coordinates(), best.observed_at(), None)?;
        Ok(true)
    }
}

/// Adapter exposing the arrival cache to the resolver.
pub struct LastArrivalSource {
    cache: ArrivalCache,
}

impl LastArrivalSource {
    pub fn new(cache: ArrivalCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl LocationSource for LastArrivalSource {
    fn name(&self) -> &str {
        "last_arrival"
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        Ok(self.cache.read(now).into_iter().collect())
    }
}
