use core_types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build the HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("Request for '{symbol}' failed: {source}")]
    Request {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to deserialize the chart response for '{symbol}': {reason}")]
    Deserialization { symbol: String, reason: String },

    #[error("No price data available for '{symbol}': {reason}")]
    DataUnavailable { symbol: String, reason: String },
}

impl ApiError {
    /// Every fetch failure surfaces as unavailable data; the variant keeps the detail.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::ClientBuild(_) => ErrorKind::Internal,
            _ => ErrorKind::DataUnavailable,
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            ApiError::ClientBuild(_) => None,
            ApiError::Request { symbol, .. }
            | ApiError::Deserialization { symbol, .. }
            | ApiError::DataUnavailable { symbol, .. } => Some(symbol),
        }
    }
}
