use core_types::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Symbol '{symbol}' has not been loaded")]
    NotFound { symbol: String },

    #[error("Only {valid} valid observations remain for '{symbol}' after cleaning; at least 2 are required")]
    InsufficientData { symbol: String, valid: usize },

    #[error("Cleaned series is malformed: {0}")]
    Series(#[from] CoreError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::InsufficientData { .. } => ErrorKind::InsufficientData,
            StoreError::Series(_) => ErrorKind::Internal,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            StoreError::NotFound { symbol } | StoreError::InsufficientData { symbol, .. } => symbol,
            StoreError::Series(CoreError::UnorderedDates { symbol, .. })
            | StoreError::Series(CoreError::InvalidValue { symbol, .. }) => symbol,
        }
    }
}
