//! Schedule feed client.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rainwatch_core::{with_retry, RetryConfig, USER_AGENT};
use tracing::instrument;

use crate::cache::FeedCache;
use crate::error::CalendarError;
use crate::types::{parse_feed, ScheduleEvent};

pub struct CalendarClient {
    client: reqwest::Client,
    feed_url: String,
    retry: RetryConfig,
    cache: FeedCache,
}

impl CalendarClient {
    pub fn new(
        feed_url: &str,
        timeout: Duration,
        cache_ttl: Duration,
        retry: RetryConfig,
    ) -> Result<Self, CalendarError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            feed_url: feed_url.to_string(),
            retry,
            cache: FeedCache::new(cache_ttl),
        })
    }

    /// Full parsed schedule, served from cache while fresh.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_events(&self) -> Result<Arc<Vec<ScheduleEvent>>, CalendarError> {
        if let Some(events) = self.cache.get() {
            tracing::debug!("Serving {} schedule entries from cache", events.len());
            return Ok(events);
        }

        let response = with_retry(&self.retry, || self.client.get(&self.feed_url).send()).await?;
        let body = self.handle_response(response).await?;
        let events = parse_feed(&body)?;

        tracing::info!("Loaded {} schedule entries", events.len());
        Ok(self.cache.put(events))
    }

    /// Schedule entries starting within `[from, to]`, oldest first.
    pub async fn events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScheduleEvent>, CalendarError> {
        let events = self.fetch_events().await?;
        Ok(events
            .iter()
            .filter(|e| e.start_utc >= from && e.start_utc <= to)
            .cloned()
            .collect())
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<String, CalendarError> {
        let status = response.status();

        if status.is_success() {
            Ok(response.text().await?)
        } else if status.as_u16() == 429 {
            Err(CalendarError::RateLimited)
        } else {
            Err(CalendarError::Status(status.as_u16()))
        }
    }
}
