//! # Market Pulse Price Store
//!
//! Holds one cleaned `PriceSeries` per symbol. Raw observations go in through
//! `PriceSeriesStore::load`, which applies the configured `CleaningPolicy`:
//!
//! 1. sort by date and keep the last observation of any duplicated date;
//! 2. treat non-finite or non-positive closes as missing;
//! 3. forward fill missing closes (a leading gap is dropped, never invented);
//! 4. remove prices whose one-day return falls outside the IQR fences of the
//!    return distribution, then fill those dates again.

pub mod cleaning;
pub mod error;
pub mod store;

pub use cleaning::{CleaningSummary, clean};
pub use error::StoreError;
pub use store::PriceSeriesStore;
