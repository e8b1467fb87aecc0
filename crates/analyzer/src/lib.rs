//! # Market Pulse Analyzer
//!
//! Orchestrates the pipeline for one analysis run:
//! `PriceSeriesStore -> ReturnCalculator -> {RiskMetricsEngine, CorrelationEngine} -> AnalysisReport`.
//!
//! A report is immutable once built; running again produces a new report with
//! a new `run_id`.

pub mod error;
pub mod report;

pub use error::ReportBuildError;
pub use report::{AnalysisReport, RankedSymbol, RiskProfile, SymbolAnalysis};

// Types that appear in report fields, so consumers need not depend on analytics.
pub use analytics::{CorrelationMatrix, DescriptiveStats, DrawdownSummary, Trend, TrendDirection};
