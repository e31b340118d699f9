//! Source and resolver error types.

use rainwatch_calendar::CalendarError;
use rainwatch_core::{NetworkError, ReqwestErrorExt};
use thiserror::Error;

/// Failure of a single adapter. Never aborts a resolution.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Source returned malformed data: {0}")]
    Malformed(String),
}

impl From<NetworkError> for SourceError {
    fn from(e: NetworkError) -> Self {
        if e.is_malformed() {
            Self::Malformed(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        e.into_network_error().into()
    }
}

impl From<CalendarError> for SourceError {
    fn from(e: CalendarError) -> Self {
        if e.is_malformed() {
            Self::Malformed(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Resolution-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Every location source failed")]
    SourceUnavailable,

    #[error("No usable location observation")]
    NoLocationAvailable,
}

impl ResolveError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "All location sources are currently unreachable.",
            Self::NoLocationAvailable => "Current location is unknown.",
        }
    }
}
