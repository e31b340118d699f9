//! Public schedule feed integration for rainwatch.
//!
//! Downloads the Factba.se calendar feed, converts its Eastern local times to
//! UTC, and keeps the parsed schedule in a short-lived in-process cache.

pub mod cache;
pub mod client;
pub mod error;
pub mod types;

pub use cache::FeedCache;
pub use client::CalendarClient;
pub use error::CalendarError;
pub use types::{FeedItem, ScheduleEvent};
