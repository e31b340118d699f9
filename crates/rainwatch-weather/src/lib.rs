//! Precipitation lookup for rainwatch
//!
//! Queries Open-Meteo current conditions for a coordinate and maps WMO
//! weather codes to thunderstorm severity.

pub mod cache;
pub mod provider;
pub mod types;

pub use cache::WeatherCache;
pub use provider::{WeatherLookup, WeatherProvider};
pub use types::*;
