//! Short-lived per-coordinate cache so repeated lookups for the same place
//! do not hit the API.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::types::PrecipitationReading;

/// Coordinates rounded to two decimals (~1 km) share a slot.
type Bucket = (i64, i64);

fn bucket(lat: f64, lon: f64) -> Bucket {
    ((lat * 100.0).round() as i64, (lon * 100.0).round() as i64)
}

#[derive(Debug)]
pub struct WeatherCache {
    ttl: Duration,
    entries: Mutex<HashMap<Bucket, (Instant, PrecipitationReading)>>,
}

impl WeatherCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, lat: f64, lon: f64) -> Option<PrecipitationReading> {
        let entries = self.entries.lock();
        entries
            .get(&bucket(lat, lon))
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, reading)| *reading)
    }

    pub fn put(&self, lat: f64, lon: f64, reading: PrecipitationReading) {
        let mut entries = self.entries.lock();
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(bucket(lat, lon), (Instant::now(), reading));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(mmh: f64) -> PrecipitationReading {
        PrecipitationReading {
            precipitation_mmh: mmh,
            weather_code: 61,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_nearby_points_share_bucket() {
        let cache = WeatherCache::new(Duration::from_secs(300));
        cache.put(26.6758, -80.0364, reading(1.5));

        let hit = cache.get(26.6771, -80.0359).unwrap();
        assert_eq!(hit.precipitation_mmh, 1.5);
        assert!(cache.get(26.70, -80.0364).is_none());
    }

    #[test]
    fn test_expired_entries_ignored() {
        let cache = WeatherCache::new(Duration::ZERO);
        cache.put(38.8977, -77.0365, reading(0.2));
        assert!(cache.get(38.8977, -77.0365).is_none());
    }

    #[test]
    fn test_clear() {
        let cache = WeatherCache::new(Duration::from_secs(300));
        cache.put(38.8977, -77.0365, reading(0.2));
        cache.clear();
        assert!(cache.get(38.8977, -77.0365).is_none());
    }
}
