//! Location source adapters.
//!
//! Each adapter turns one upstream feed into [`LocationObservation`]s. Adapters
//! know nothing about decay or about each other; the resolver owns both.

pub mod adsbfi;
pub mod arrival_cache;
pub mod calendar;
pub mod fleet;
pub mod newswire;
pub mod opensky;
pub mod place_aliases;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rainwatch_core::USER_AGENT;

use crate::error::SourceError;
use crate::types::LocationObservation;

pub use adsbfi::AdsbFiSource;
pub use arrival_cache::{ArrivalCache, LastArrivalSource};
pub use calendar::CalendarSource;
pub use newswire::NewswireSource;
pub use opensky::OpenSkySource;

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Short stable name used in logs and source reports
    fn name(&self) -> &str;

    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<LocationObservation>, SourceError>;
}

/// HTTP client shared by the network adapters.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SourceError::Unavailable(format!("failed to build HTTP client: {}", e)))
}
