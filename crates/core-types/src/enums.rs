use serde::{Deserialize, Serialize};
use std::fmt;

/// The market sector a symbol is grouped under in the analysis universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Technology,
    Financial,
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sector::Technology => write!(f, "Technology"),
            Sector::Financial => write!(f, "Financial"),
        }
    }
}

/// The failure categories surfaced to presentation layers.
///
/// Each crate's error type maps onto one of these so the CLI and the HTTP API
/// can report what went wrong without knowing which component raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InsufficientData,
    InvalidPrice,
    InvalidWindow,
    InsufficientOverlap,
    DataUnavailable,
    ReportBuild,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InsufficientData => "insufficient_data",
            ErrorKind::InvalidPrice => "invalid_price",
            ErrorKind::InvalidWindow => "invalid_window",
            ErrorKind::InsufficientOverlap => "insufficient_overlap",
            ErrorKind::DataUnavailable => "data_unavailable",
            ErrorKind::ReportBuild => "report_build",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
