use crate::error::AnalyticsError;
use core_types::{DatedSeries, Observation, PriceSeries, ReturnSeries};

/// A stateless calculator deriving simple daily returns from prices.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnCalculator;

impl ReturnCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Computes `r[t] = (p[t] - p[t-1]) / p[t-1]` for every consecutive pair.
    ///
    /// The result is dated by the later day of each pair and holds one
    /// observation fewer than `prices`. A non-positive previous price is
    /// rejected with `InvalidPrice` rather than producing an infinite return.
    pub fn compute(&self, prices: &PriceSeries) -> Result<ReturnSeries, AnalyticsError> {
        let returns = prices
            .observations()
            .windows(2)
            .map(|w| {
                let (prev, curr) = (w[0], w[1]);
                if !(prev.value.is_finite() && prev.value > 0.0) {
                    return Err(AnalyticsError::InvalidPrice {
                        symbol: prices.symbol().to_string(),
                        date: prev.date,
                        price: prev.value,
                    });
                }
                Ok(Observation::new(curr.date, (curr.value - prev.value) / prev.value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(symbol = prices.symbol(), returns = returns.len(), "Computed daily returns");
        Ok(ReturnSeries::new(prices.symbol(), returns)?)
    }
}

/// Compounded growth since the start of the series: `(1 + r).cumprod() - 1`.
pub fn cumulative_returns(returns: &ReturnSeries) -> Vec<Observation> {
    let mut growth = 1.0;
    returns
        .observations()
        .iter()
        .map(|o| {
            growth *= 1.0 + o.value;
            Observation::new(o.date, growth - 1.0)
        })
        .collect()
}

/// Prices rescaled so the first observation equals `base`.
pub fn normalized_prices(prices: &PriceSeries, base: f64) -> Vec<Observation> {
    let Some(first) = prices.first() else {
        return Vec::new();
    };
    prices
        .observations()
        .iter()
        .map(|o| Observation::new(o.date, o.value / first.value * base))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn prices(symbol: &str, values: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(start + Duration::days(i as i64), *v))
            .collect();
        PriceSeries::new(symbol, observations).unwrap()
    }

    #[test]
    fn returns_are_dated_by_the_later_day() {
        let series = prices("AAPL", &[100.0, 110.0, 99.0]);
        let returns = ReturnCalculator::new().compute(&series).unwrap();

        assert_eq!(returns.symbol(), "AAPL");
        assert_eq!(returns.len(), 2);
        assert_eq!(returns.observations()[0].date, series.observations()[1].date);
        assert!((returns.observations()[0].value - 0.10).abs() < 1e-12);
        assert!((returns.observations()[1].value + 0.10).abs() < 1e-12);
    }

    #[test]
    fn single_price_has_no_returns() {
        let returns = ReturnCalculator::new().compute(&prices("MSFT", &[42.0])).unwrap();
        assert!(returns.is_empty());
    }

    #[test]
    fn cumulative_returns_compound() {
        let returns = ReturnCalculator::new()
            .compute(&prices("GS", &[100.0, 110.0, 121.0]))
            .unwrap();
        let growth = cumulative_returns(&returns);
        assert!((growth[0].value - 0.10).abs() < 1e-12);
        assert!((growth[1].value - 0.21).abs() < 1e-12);
    }

    #[test]
    fn normalized_prices_start_at_base() {
        let normalized = normalized_prices(&prices("BAC", &[20.0, 25.0, 15.0]), 100.0);
        let values: Vec<f64> = normalized.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![100.0, 125.0, 75.0]);
    }

    proptest! {
        #[test]
        fn n_prices_yield_n_minus_one_exact_returns(
            values in proptest::collection::vec(0.01f64..10_000.0, 1..200),
        ) {
            let series = prices("PROP", &values);
            let returns = ReturnCalculator::new().compute(&series).unwrap();

            prop_assert_eq!(returns.len(), values.len() - 1);
            for (t, r) in returns.observations().iter().enumerate() {
                let expected = (values[t + 1] - values[t]) / values[t];
                prop_assert!((r.value - expected).abs() <= 1e-12 * expected.abs().max(1.0));
            }
        }
    }
}
