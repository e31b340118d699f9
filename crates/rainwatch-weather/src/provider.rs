use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rainwatch_core::{with_retry, RetryConfig, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::cache::WeatherCache;
use crate::types::{PrecipitationReading, WeatherError};

/// Anything that can report current precipitation at a coordinate.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn query(&self, lat: f64, lon: f64) -> Result<PrecipitationReading, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    precipitation: Option<f64>,
    /// Older API revisions only report `rain`
    rain: Option<f64>,
    #[serde(alias = "weathercode")]
    weather_code: Option<i32>,
}

/// Open-Meteo current-conditions client
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    api_url: String,
    retry: RetryConfig,
    cache: Arc<WeatherCache>,
}

impl WeatherProvider {
    pub fn new(
        api_url: &str,
        timeout: Duration,
        cache_ttl: Duration,
        retry: RetryConfig,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            api_url: api_url.to_string(),
            retry,
            cache: Arc::new(WeatherCache::new(cache_ttl)),
        })
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, lat: f64, lon: f64) -> Result<PrecipitationReading, WeatherError> {
        let latitude = format!("{:.4}", lat);
        let longitude = format!("{:.4}", lon);

        let response = with_retry(&self.retry, || {
            self.client
                .get(&self.api_url)
                .query(&[
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("current", "precipitation,rain,weather_code"),
                ])
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let current = body
            .current
            .ok_or_else(|| WeatherError::Parse("response has no current block".to_string()))?;

        let precipitation_mmh = current
            .precipitation
            .or(current.rain)
            .ok_or_else(|| WeatherError::Parse("no precipitation field".to_string()))?;

        Ok(PrecipitationReading {
            precipitation_mmh,
            weather_code: current.weather_code.unwrap_or(0),
            observed_at: Utc::now(),
        })
    }
}

#[async_trait]
impl WeatherLookup for WeatherProvider {
    async fn query(&self, lat: f64, lon: f64) -> Result<PrecipitationReading, WeatherError> {
        if let Some(cached) = self.cache.get(lat, lon) {
            tracing::debug!("Weather cache hit for ({:.2}, {:.2})", lat, lon);
            return Ok(cached);
        }

        let reading = self.fetch(lat, lon).await?;
        tracing::info!(
            "Weather at ({:.2}, {:.2}): {:.1} mm/h, code {}",
            lat,
            lon,
            reading.precipitation_mmh,
            reading.weather_code
        );
        self.cache.put(lat, lon, reading);
        Ok(reading)
    }
}
