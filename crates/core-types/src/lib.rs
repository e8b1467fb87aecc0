//! # Market Pulse Core Types
//!
//! Layer 0 of the workspace: the strongly-typed, date-keyed series every other
//! crate passes around. Nothing in here performs I/O.
//!
//! - `RawObservation`: a single fetched close, possibly missing.
//! - `Observation`: a single valid `(date, value)` point.
//! - `PriceSeries`, `ReturnSeries`, `RollingVolatility`: ordered series owned by one symbol.
//! - `DatedSeries`: the shared read-only view over those series.

pub mod enums;
pub mod error;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use enums::{ErrorKind, Sector};
pub use error::CoreError;
pub use series::{
    DatedSeries, Observation, PriceSeries, RawObservation, ReturnSeries, RollingVolatility, Symbol,
};
