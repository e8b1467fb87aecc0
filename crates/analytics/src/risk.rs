use crate::correlation::align_on_common_dates;
use crate::error::AnalyticsError;
use crate::stats::{self, Trend};
use configuration::AnalysisParams;
use core_types::{DatedSeries, Observation, PriceSeries, ReturnSeries, RollingVolatility};
use serde::Serialize;

/// The deepest peak-to-trough decline of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawdownSummary {
    /// Fraction of the peak lost at the trough, in [0, 1].
    pub max_drawdown: f64,
    /// `None` when prices never fall below a previous high.
    pub peak: Option<Observation>,
    pub trough: Option<Observation>,
}

/// Computes per-symbol risk statistics with explicitly supplied parameters.
#[derive(Debug, Clone)]
pub struct RiskMetricsEngine {
    params: AnalysisParams,
}

impl RiskMetricsEngine {
    pub fn new(params: AnalysisParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Annualized sample volatility over a trailing window of returns.
    ///
    /// The value dated `t` is computed from the `window` returns ending at `t`,
    /// so later returns never influence earlier values. Dates before the first
    /// full window are absent from the result.
    pub fn rolling_volatility(
        &self,
        returns: &ReturnSeries,
        window: usize,
    ) -> Result<RollingVolatility, AnalyticsError> {
        let observations = returns.observations();
        if window < 2 || window > observations.len() {
            return Err(AnalyticsError::InvalidWindow {
                symbol: returns.symbol().to_string(),
                window,
                len: observations.len(),
            });
        }

        let factor = self.params.annualization_factor();
        let values = returns.values();
        let volatility = (window..=values.len())
            .filter_map(|end| {
                let std = stats::sample_std_dev(&values[end - window..end])?;
                Some(Observation::new(observations[end - 1].date, std * factor))
            })
            .collect();

        Ok(RollingVolatility::new(returns.symbol(), window, volatility)?)
    }

    /// Annualized Sharpe ratio for an annual `risk_free_rate`.
    ///
    /// Returns `Ok(None)` when every return is identical: the standard deviation
    /// is zero and the ratio is undefined.
    pub fn sharpe_ratio(
        &self,
        returns: &ReturnSeries,
        risk_free_rate: f64,
    ) -> Result<Option<f64>, AnalyticsError> {
        let values = returns.values();
        let (Some(mean), Some(std)) = (stats::mean(&values), stats::sample_std_dev(&values)) else {
            return Err(insufficient(returns.symbol(), 2, values.len()));
        };

        if std == 0.0 {
            tracing::debug!(symbol = returns.symbol(), "Flat return series; Sharpe ratio undefined");
            return Ok(None);
        }

        let daily_rf = risk_free_rate / f64::from(self.params.trading_days_per_year);
        Ok(Some((mean - daily_rf) / std * self.params.annualization_factor()))
    }

    /// Largest `(running_max - price) / running_max` over the series.
    pub fn max_drawdown(&self, prices: &PriceSeries) -> Result<f64, AnalyticsError> {
        Ok(self.drawdown_details(prices)?.max_drawdown)
    }

    /// Maximum drawdown together with the peak and trough that produced it.
    pub fn drawdown_details(&self, prices: &PriceSeries) -> Result<DrawdownSummary, AnalyticsError> {
        let observations = prices.observations();
        let Some(&first) = observations.first() else {
            return Err(insufficient(prices.symbol(), 1, 0));
        };

        let mut running_peak = first;
        let mut summary = DrawdownSummary {
            max_drawdown: 0.0,
            peak: None,
            trough: None,
        };

        for &obs in observations {
            if obs.value > running_peak.value {
                running_peak = obs;
            }
            let drawdown = (running_peak.value - obs.value) / running_peak.value;
            if drawdown > summary.max_drawdown {
                summary = DrawdownSummary {
                    max_drawdown: drawdown,
                    peak: Some(running_peak),
                    trough: Some(obs),
                };
            }
        }

        Ok(summary)
    }

    /// Mean daily return scaled to a year.
    pub fn annualized_return(&self, returns: &ReturnSeries) -> Result<f64, AnalyticsError> {
        let values = returns.values();
        stats::mean(&values)
            .map(|m| m * f64::from(self.params.trading_days_per_year))
            .ok_or_else(|| insufficient(returns.symbol(), 1, 0))
    }

    /// Full-sample standard deviation of daily returns scaled to a year.
    pub fn annualized_volatility(&self, returns: &ReturnSeries) -> Result<f64, AnalyticsError> {
        let values = returns.values();
        stats::sample_std_dev(&values)
            .map(|s| s * self.params.annualization_factor())
            .ok_or_else(|| insufficient(returns.symbol(), 2, values.len()))
    }

    /// Sensitivity of `asset` to `benchmark` over their common dates.
    ///
    /// `Ok(None)` when the benchmark has zero variance on those dates.
    pub fn beta(
        &self,
        asset: &ReturnSeries,
        benchmark: &ReturnSeries,
    ) -> Result<Option<f64>, AnalyticsError> {
        let (_, columns) = align_on_common_dates(&[asset, benchmark])?;
        let (a, b) = (&columns[0], &columns[1]);

        match (stats::covariance(a, b), stats::sample_std_dev(b)) {
            (Some(cov), Some(std)) if std > 0.0 => Ok(Some(cov / (std * std))),
            _ => Ok(None),
        }
    }

    /// Least-squares trend of prices against trading-day index.
    pub fn trend(&self, prices: &PriceSeries) -> Result<Trend, AnalyticsError> {
        stats::linear_trend(&prices.values())
            .ok_or_else(|| insufficient(prices.symbol(), 2, prices.len()))
    }
}

fn insufficient(symbol: &str, needed: usize, actual: usize) -> AnalyticsError {
    AnalyticsError::InsufficientData {
        symbol: symbol.to_string(),
        needed,
        actual,
    }
}
