//! A local CSV cache of fetched closing prices.
//!
//! Each file holds one symbol over one requested date range, so a run can be
//! reproduced without going back to the network. Missing closes are written
//! as empty fields and read back as missing markers.

pub mod cache;
pub mod error;

pub use cache::CsvPriceCache;
pub use error::CacheError;
