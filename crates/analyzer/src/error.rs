use analytics::AnalyticsError;
use core_types::ErrorKind;
use price_store::StoreError;
use thiserror::Error;

/// Why an `AnalysisReport` could not be produced.
///
/// There is no partial report: the first failing symbol aborts the build and
/// its cause is kept as the error source.
#[derive(Error, Debug)]
pub enum ReportBuildError {
    #[error("No symbols were requested for the report")]
    NoSymbols,

    #[error("Report build failed while loading '{symbol}': {source}")]
    Load {
        symbol: String,
        #[source]
        source: StoreError,
    },

    #[error("Report build failed while analysing '{symbol}': {source}")]
    Analysis {
        symbol: String,
        #[source]
        source: AnalyticsError,
    },

    #[error("Report build failed while correlating {symbols:?}: {source}")]
    Correlation {
        symbols: Vec<String>,
        #[source]
        source: AnalyticsError,
    },
}

impl ReportBuildError {
    /// The kind of the underlying component failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportBuildError::NoSymbols => ErrorKind::InvalidInput,
            ReportBuildError::Load { source, .. } => source.kind(),
            ReportBuildError::Analysis { source, .. }
            | ReportBuildError::Correlation { source, .. } => source.kind(),
        }
    }

    /// The symbol the failure is attributed to, if any.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            ReportBuildError::Load { symbol, .. } | ReportBuildError::Analysis { symbol, .. } => {
                Some(symbol)
            }
            ReportBuildError::Correlation { source, .. } => source.symbol(),
            ReportBuildError::NoSymbols => None,
        }
    }
}
