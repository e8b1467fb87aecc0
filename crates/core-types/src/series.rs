use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A ticker symbol such as `"AAPL"`.
pub type Symbol = String;

/// A single closing price as delivered by a price source.
///
/// `close` is `None` when the source marked the day as missing; the date is
/// still part of the trading calendar for that symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

impl RawObservation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close: Some(close),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, close: None }
    }
}

/// A single valid point of a dated series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Read-only access shared by every series owned by a symbol.
///
/// Implementors guarantee their observations are strictly increasing by date,
/// so lookups by date can binary search.
pub trait DatedSeries {
    fn symbol(&self) -> &str;

    fn observations(&self) -> &[Observation];

    fn len(&self) -> usize {
        self.observations().len()
    }

    fn is_empty(&self) -> bool {
        self.observations().is_empty()
    }

    fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.observations().iter().map(|o| o.date)
    }

    fn values(&self) -> Vec<f64> {
        self.observations().iter().map(|o| o.value).collect()
    }

    fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let observations = self.observations();
        observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|idx| observations[idx].value)
    }

    fn first(&self) -> Option<&Observation> {
        self.observations().first()
    }

    fn last(&self) -> Option<&Observation> {
        self.observations().last()
    }
}

/// Checks ordering and applies `is_valid` to every value.
fn validate(
    symbol: &str,
    observations: &[Observation],
    is_valid: impl Fn(f64) -> bool,
) -> Result<(), CoreError> {
    for (idx, obs) in observations.iter().enumerate() {
        if !is_valid(obs.value) {
            return Err(CoreError::InvalidValue {
                symbol: symbol.to_string(),
                date: obs.date,
                value: obs.value,
            });
        }
        if idx > 0 && observations[idx - 1].date >= obs.date {
            return Err(CoreError::UnorderedDates {
                symbol: symbol.to_string(),
                date: obs.date,
            });
        }
    }
    Ok(())
}

/// A cleaned daily close-price history.
///
/// Dates are strictly increasing and every price is positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: Symbol,
    observations: Vec<Observation>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<Symbol>, observations: Vec<Observation>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        validate(&symbol, &observations, |p| p.is_finite() && p > 0.0)?;
        Ok(Self {
            symbol,
            observations,
        })
    }
}

impl DatedSeries for PriceSeries {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

/// Simple daily returns derived from a `PriceSeries`.
///
/// The first date of the source series has no return, so a series derived
/// from N prices holds N - 1 observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    symbol: Symbol,
    observations: Vec<Observation>,
}

impl ReturnSeries {
    pub fn new(symbol: impl Into<Symbol>, observations: Vec<Observation>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        validate(&symbol, &observations, f64::is_finite)?;
        Ok(Self {
            symbol,
            observations,
        })
    }
}

impl DatedSeries for ReturnSeries {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

/// Annualized volatility over a trailing window of returns.
///
/// Dates without a full window are absent rather than zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingVolatility {
    symbol: Symbol,
    window: usize,
    observations: Vec<Observation>,
}

impl RollingVolatility {
    pub fn new(
        symbol: impl Into<Symbol>,
        window: usize,
        observations: Vec<Observation>,
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        validate(&symbol, &observations, |v| v.is_finite() && v >= 0.0)?;
        Ok(Self {
            symbol,
            window,
            observations,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl DatedSeries for RollingVolatility {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn price_series_rejects_duplicate_dates() {
        let err = PriceSeries::new(
            "AAPL",
            vec![Observation::new(d(2), 10.0), Observation::new(d(2), 11.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::UnorderedDates {
                symbol: "AAPL".into(),
                date: d(2)
            }
        );
    }

    #[test]
    fn price_series_rejects_non_positive_prices() {
        let err = PriceSeries::new(
            "MSFT",
            vec![Observation::new(d(2), 10.0), Observation::new(d(3), 0.0)],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidValue { value, .. } if value == 0.0));
    }

    #[test]
    fn return_series_allows_negative_values() {
        let series = ReturnSeries::new(
            "JPM",
            vec![Observation::new(d(3), -0.02), Observation::new(d(4), 0.01)],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.value_at(d(3)), Some(-0.02));
        assert_eq!(series.value_at(d(5)), None);
    }

    #[test]
    fn series_serializes_with_symbol_and_points() {
        let series =
            PriceSeries::new("GS", vec![Observation::new(d(2), 300.5)]).unwrap();
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["symbol"], "GS");
        assert_eq!(json["observations"][0]["date"], "2024-01-02");
        assert_eq!(json["observations"][0]["value"], 300.5);
    }
}
