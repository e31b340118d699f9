//! Location-confidence resolver.
//!
//! Fuses aircraft transponder fixes, the public schedule, newswire datelines
//! and the last known arrival into one ranked location estimate, then turns
//! that estimate into a rain report.

pub mod decay;
pub mod error;
pub mod overnight;
pub mod region;
pub mod report;
pub mod resolver;
pub mod sources;
pub mod types;

pub use error::{ResolveError, SourceError};
pub use report::{RainReport, ReportCoords, ReportStatus};
pub use resolver::Resolver;
pub use sources::LocationSource;
pub use types::{
    Coordinates, FlightInfo, LocationObservation, RankedEstimate, ResolutionResult, SourceKind,
    SourceOutcome, SourceReport,
};
