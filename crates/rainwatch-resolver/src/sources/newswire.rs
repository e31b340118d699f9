//! GDELT doc API datelines.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rainwatch_core::{with_retry, RetryConfig};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::{http_client, LocationSource};
use crate::error::SourceError;
use crate::types::{Coordinates, LocationObservation, SourceKind};

const QUERY: &str = "\"Donald Trump\" sourcecountry:US";
const MAX_RECORDS: &str = "75";
const NARROW_WINDOW_HOURS: i64 = 2;
const FALLBACK_TIMESPAN: &str = "7d";
const SEENDATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Default, Deserialize)]
struct ArticleList {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    seendate: Option<String>,
    #[serde(default)]
    spatial: Vec<SpatialEntry>,
}

#[derive(Debug, Deserialize)]
struct SpatialEntry {
    #[serde(default)]
    lat: Option<Value>,
    #[serde(default)]
    lon: Option<Value>,
    #[serde(default)]
    location: Option<String>,
}

/// How far back a probe looks
#[derive(Debug, Clone, Copy)]
enum Probe {
    Since(DateTime<Utc>),
    Timespan(&'static str),
}

pub struct NewswireSource {
    client: reqwest::Client,
    api_url: String,
    retry: RetryConfig,
}

impl NewswireSource {
    pub fn new(api_url: &str, timeout: Duration, retry: RetryConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_url: api_url.to_string(),
            retry,
        })
    }

    async fn probe(&self, window: Probe) -> Result<ArticleList, SourceError> {
        let mut params = vec![
            ("query", QUERY.to_string()),
            ("mode", "ArtList".to_string()),
            ("format", "json".to_string()),
            ("maxrecords", MAX_RECORDS.to_string()),
        ];
        match window {
            Probe::Since(since) => {
                params.push(("startdatetime", since.format("%Y%m%d%H%M%S").to_string()))
            }
            Probe::Timespan(span) => params.push(("timespan", span.to_string())),
        }

        let response =
            with_retry(&self.retry, || self.client.get(&self.api_url).query(&params).send())
                .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!("GDELT returned HTTP {}", status)));
        }

        // GDELT answers some queries with an empty body instead of `{}`
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(ArticleList::default());
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl LocationSource for NewswireSource {
    fn name(&self) -> &str {
        "newswire"
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError> {
        let narrow = Probe::Since(now - chrono::Duration::hours(NARROW_WINDOW_HOURS));

        let articles = match self.probe(narrow).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("GDELT narrow probe failed, widening to {}: {}", FALLBACK_TIMESPAN, e);
                self.probe(Probe::Timespan(FALLBACK_TIMESPAN)).await?
            }
        };

        Ok(first_dateline(&articles.articles).into_iter().collect())
    }
}

fn first_dateline(articles: &[Article]) -> Option<LocationObservation> {
    articles.iter().find_map(|article| {
        let seen = article.seendate.as_deref().and_then(parse_seendate)?;
        article.spatial.iter().find_map(|entry| {
            let coordinates = Coordinates::new(number(entry.lat.as_ref())?, number(entry.lon.as_ref())?);
            if !coordinates.is_valid() {
                return None;
            }
            let place = title_case(entry.location.as_deref().unwrap_or(""));
            Some(
                LocationObservation::new(SourceKind::NewswireGeocode, coordinates, seen)
                    .with_place_name(format!("News dateline: {}", place)),
            )
        })
    })
}

fn parse_seendate(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), SEENDATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Accepts both JSON numbers and numeric strings.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
