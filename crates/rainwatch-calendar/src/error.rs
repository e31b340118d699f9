//! Calendar feed error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Feed returned HTTP {0}")]
    Status(u16),

    #[error("Rate limited by feed host")]
    RateLimited,

    #[error("Invalid feed data: {0}")]
    InvalidFeed(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl CalendarError {
    /// Whether the payload was unusable rather than the transport failing.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::InvalidFeed(_) => true,
            Self::NetworkError(e) => e.is_decode(),
            _ => false,
        }
    }
}
