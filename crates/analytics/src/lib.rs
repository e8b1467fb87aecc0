//! # Market Pulse Analytics
//!
//! The statistical core of the pipeline: returns, risk metrics and correlations
//! over cleaned, date-keyed series.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` and `configuration` (Layer 0).
//! - **Explicit Parameters:** Window sizes, annualization and the risk-free rate are passed
//!   in through `AnalysisParams`; no calculation reads process-wide state.
//! - **Fail Fast:** Every engine validates its own preconditions and returns a specific
//!   `AnalyticsError` instead of degraded output.
//!
//! ## Public API
//!
//! - `ReturnCalculator`: prices to simple daily returns.
//! - `RiskMetricsEngine`: rolling volatility, Sharpe ratio, drawdown, beta, trend.
//! - `CorrelationEngine`: date-aligned pairwise correlation matrices.
//! - `stats`: the descriptive statistics the engines are built on.

// Declare the modules that constitute this crate.
pub mod correlation;
pub mod error;
pub mod returns;
pub mod risk;
pub mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use correlation::{CorrelationEngine, CorrelationMatrix, align_on_common_dates};
pub use error::AnalyticsError;
pub use returns::{ReturnCalculator, cumulative_returns, normalized_prices};
pub use risk::{DrawdownSummary, RiskMetricsEngine};
pub use stats::{DescriptiveStats, Trend, TrendDirection};
