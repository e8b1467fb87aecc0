use chrono::NaiveDate;
use core_types::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid price {price} for '{symbol}' on {date}: returns require strictly positive prices")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        price: f64,
    },

    #[error(
        "Invalid rolling window {window} for '{symbol}': must be at least 2 and at most the {len} available returns"
    )]
    InvalidWindow {
        symbol: String,
        window: usize,
        len: usize,
    },

    #[error("Not enough data for '{symbol}': need {needed} observations, have {actual}")]
    InsufficientData {
        symbol: String,
        needed: usize,
        actual: usize,
    },

    #[error("Symbols {symbols:?} share only {common_dates} common dates; at least 2 are required")]
    InsufficientOverlap {
        symbols: Vec<String>,
        common_dates: usize,
    },

    #[error("Failed to construct series: {0}")]
    Series(#[from] CoreError),
}

impl AnalyticsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyticsError::InvalidPrice { .. } => ErrorKind::InvalidPrice,
            AnalyticsError::InvalidWindow { .. } => ErrorKind::InvalidWindow,
            AnalyticsError::InsufficientData { .. } => ErrorKind::InsufficientData,
            AnalyticsError::InsufficientOverlap { .. } => ErrorKind::InsufficientOverlap,
            AnalyticsError::Series(_) => ErrorKind::Internal,
        }
    }

    /// The symbol the failure is attributed to, if a single one is.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            AnalyticsError::InvalidPrice { symbol, .. }
            | AnalyticsError::InvalidWindow { symbol, .. }
            | AnalyticsError::InsufficientData { symbol, .. } => Some(symbol),
            AnalyticsError::Series(CoreError::UnorderedDates { symbol, .. })
            | AnalyticsError::Series(CoreError::InvalidValue { symbol, .. }) => Some(symbol),
            AnalyticsError::InsufficientOverlap { .. } => None,
        }
    }
}
