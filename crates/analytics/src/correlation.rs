use crate::error::AnalyticsError;
use crate::stats;
use chrono::NaiveDate;
use configuration::CorrelationMethod;
use core_types::{DatedSeries, ReturnSeries, Symbol};
use serde::Serialize;
use std::collections::BTreeSet;

/// Aligns series on the dates present in every one of them.
///
/// Returns the common dates and, per input series in order, its values on those
/// dates. Fails with `InsufficientOverlap` when fewer than two dates are shared.
pub fn align_on_common_dates(
    series: &[&ReturnSeries],
) -> Result<(Vec<NaiveDate>, Vec<Vec<f64>>), AnalyticsError> {
    let mut common: BTreeSet<NaiveDate> = match series.first() {
        Some(first) => first.dates().collect(),
        None => BTreeSet::new(),
    };
    for s in series.iter().skip(1) {
        let dates: BTreeSet<NaiveDate> = s.dates().collect();
        common.retain(|d| dates.contains(d));
    }

    if common.len() < 2 {
        return Err(AnalyticsError::InsufficientOverlap {
            symbols: series.iter().map(|s| s.symbol().to_string()).collect(),
            common_dates: common.len(),
        });
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let columns = series
        .iter()
        .map(|s| dates.iter().filter_map(|d| s.value_at(*d)).collect())
        .collect();
    Ok((dates, columns))
}

/// Pairwise correlation coefficients between symbols' returns.
///
/// Symmetric with 1.0 on the diagonal. Rows and columns follow `symbols()`.
/// An off-diagonal cell is `None` when either side has zero variance over the
/// common dates; it is never reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    method: CorrelationMethod,
    symbols: Vec<Symbol>,
    coefficients: Vec<Vec<Option<f64>>>,
    common_dates: usize,
    start: NaiveDate,
    end: NaiveDate,
}

impl CorrelationMatrix {
    pub fn method(&self) -> CorrelationMethod {
        self.method
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.coefficients
    }

    /// Number of aligned dates the coefficients were computed over.
    pub fn common_dates(&self) -> usize {
        self.common_dates
    }

    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }

    fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Coefficient for a pair; `None` if either symbol is not in the matrix or
    /// the coefficient is undefined.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.coefficients[self.index_of(a)?][self.index_of(b)?]
    }

    /// Pairs whose coefficient is undefined.
    pub fn undefined_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        let n = self.symbols.len();
        (0..n)
            .flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.coefficients[i][j].is_none())
            .map(|(i, j)| (self.symbols[i].as_str(), self.symbols[j].as_str()))
    }

    fn off_diagonal(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.symbols.len();
        (0..n).flat_map(move |i| {
            (i + 1..n).filter_map(move |j| self.coefficients[i][j].map(|c| (i, j, c)))
        })
    }

    /// Mean coefficient over distinct pairs with a defined coefficient.
    pub fn mean_off_diagonal(&self) -> Option<f64> {
        let values: Vec<f64> = self.off_diagonal().map(|(_, _, c)| c).collect();
        stats::mean(&values)
    }

    /// The most positively correlated distinct pair.
    pub fn strongest_pair(&self) -> Option<(&str, &str, f64)> {
        self.off_diagonal()
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(i, j, c)| (self.symbols[i].as_str(), self.symbols[j].as_str(), c))
    }
}

/// Builds correlation matrices over the common dates of several return series.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationEngine {
    method: CorrelationMethod,
}

impl CorrelationEngine {
    pub fn new(method: CorrelationMethod) -> Self {
        Self { method }
    }

    /// Correlates every pair of `returns` over the dates they all share.
    ///
    /// Each unordered pair is computed once and mirrored; the diagonal is set to
    /// 1.0 without computation. A symbol listed twice is kept once. Pairs that
    /// involve a series with zero variance on the common dates are `None`.
    pub fn correlation_matrix<'a>(
        &self,
        returns: impl IntoIterator<Item = &'a ReturnSeries>,
    ) -> Result<CorrelationMatrix, AnalyticsError> {
        let mut series: Vec<&ReturnSeries> = Vec::new();
        for s in returns {
            if !series.iter().any(|existing| existing.symbol() == s.symbol()) {
                series.push(s);
            }
        }

        let (dates, columns) = align_on_common_dates(&series)?;

        if series.len() > 1 {
            for (s, column) in series.iter().zip(&columns) {
                if stats::sample_std_dev(column) == Some(0.0) {
                    tracing::warn!(
                        symbol = s.symbol(),
                        "Flat returns over the common dates; its correlations are undefined"
                    );
                }
            }
        }

        let columns: Vec<Vec<f64>> = match self.method {
            CorrelationMethod::Pearson => columns,
            CorrelationMethod::Spearman => columns.iter().map(|c| stats::average_ranks(c)).collect(),
        };

        let n = series.len();
        let mut coefficients = vec![vec![None; n]; n];
        for i in 0..n {
            coefficients[i][i] = Some(1.0);
            for j in (i + 1)..n {
                let coefficient = stats::pearson(&columns[i], &columns[j]);
                coefficients[i][j] = coefficient;
                coefficients[j][i] = coefficient;
            }
        }

        tracing::debug!(
            symbols = n,
            common_dates = dates.len(),
            method = ?self.method,
            "Computed correlation matrix"
        );

        Ok(CorrelationMatrix {
            method: self.method,
            symbols: series.iter().map(|s| s.symbol().to_string()).collect(),
            coefficients,
            common_dates: dates.len(),
            start: dates[0],
            end: dates[dates.len() - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Observation;
    use proptest::prelude::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> ReturnSeries {
        let obs = points.iter().map(|(day, v)| Observation::new(d(*day), *v)).collect();
        ReturnSeries::new(symbol, obs).unwrap()
    }

    #[test]
    fn aligns_on_date_intersection_not_position() {
        let a = series("A", &[(1, 0.01), (2, 0.02), (3, -0.01), (6, 0.03)]);
        let b = series("B", &[(2, 0.05), (3, -0.02), (4, 0.01), (6, 0.04)]);

        let (dates, columns) = align_on_common_dates(&[&a, &b]).unwrap();
        assert_eq!(dates, vec![d(2), d(3), d(6)]);
        assert_eq!(columns[0], vec![0.02, -0.01, 0.03]);
        assert_eq!(columns[1], vec![0.05, -0.02, 0.04]);
    }

    #[test]
    fn insufficient_overlap_fails() {
        let a = series("A", &[(1, 0.01), (2, 0.02), (3, 0.03)]);
        let b = series("B", &[(3, 0.01), (4, 0.02), (5, 0.01)]);

        let err = CorrelationEngine::default().correlation_matrix([&a, &b]).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::InsufficientOverlap {
                symbols: vec!["A".into(), "B".into()],
                common_dates: 1
            }
        );
    }

    #[test]
    fn matrix_has_unit_diagonal_and_expected_pairs() {
        let a = series("A", &[(1, 0.01), (2, 0.02), (3, -0.01), (4, 0.00)]);
        let b = series("B", &[(1, 0.02), (2, 0.04), (3, -0.02), (4, 0.00)]);
        let c = series("C", &[(1, -0.01), (2, -0.02), (3, 0.01), (4, 0.00)]);

        let matrix = CorrelationEngine::default().correlation_matrix([&a, &b, &c]).unwrap();
        assert_eq!(matrix.symbols(), &["A", "B", "C"]);
        assert_eq!(matrix.common_dates(), 4);
        assert_eq!(matrix.get("A", "A"), Some(1.0));
        assert!((matrix.get("A", "B").unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get("A", "C").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("A", "Z"), None);

        let (x, y, c_max) = matrix.strongest_pair().unwrap();
        assert_eq!((x, y), ("A", "B"));
        assert!((c_max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_pairs_are_undefined_not_zero() {
        let a = series("A", &[(1, 0.01), (2, 0.02), (3, -0.01)]);
        let b = series("B", &[(1, 0.02), (2, 0.01), (3, -0.03)]);
        let flat = series("FLAT", &[(1, 0.0), (2, 0.0), (3, 0.0)]);

        let matrix = CorrelationEngine::default()
            .correlation_matrix([&a, &flat, &b])
            .unwrap();
        assert_eq!(matrix.get("FLAT", "FLAT"), Some(1.0));
        assert_eq!(matrix.get("A", "FLAT"), None);
        assert_eq!(matrix.get("FLAT", "B"), None);
        assert!(matrix.get("A", "B").is_some());
        assert_eq!(
            matrix.undefined_pairs().collect::<Vec<_>>(),
            vec![("A", "FLAT"), ("FLAT", "B")]
        );
        assert_eq!(matrix.strongest_pair().map(|(x, y, _)| (x, y)), Some(("A", "B")));
    }

    #[test]
    fn spearman_uses_ranks() {
        // monotone but non-linear relationship
        let a = series("A", &[(1, 0.01), (2, 0.02), (3, 0.03), (4, 0.04)]);
        let b = series("B", &[(1, 0.001), (2, 0.008), (3, 0.027), (4, 0.064)]);

        let pearson = CorrelationEngine::new(CorrelationMethod::Pearson)
            .correlation_matrix([&a, &b])
            .unwrap();
        let spearman = CorrelationEngine::new(CorrelationMethod::Spearman)
            .correlation_matrix([&a, &b])
            .unwrap();

        assert!(pearson.get("A", "B").unwrap() < 1.0 - 1e-6);
        assert!((spearman.get("A", "B").unwrap() - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn matrix_is_symmetric_with_unit_diagonal(
            columns in proptest::collection::vec(
                proptest::collection::vec(-0.05f64..0.05, 12),
                2..6,
            ),
        ) {
            let all: Vec<ReturnSeries> = columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let points: Vec<(u32, f64)> =
                        col.iter().enumerate().map(|(day, v)| (day as u32 + 1, *v)).collect();
                    series(&format!("S{i}"), &points)
                })
                .collect();

            let matrix = CorrelationEngine::default().correlation_matrix(all.iter()).unwrap();
            let rows = matrix.rows();
            for i in 0..rows.len() {
                prop_assert_eq!(rows[i][i], Some(1.0));
                for j in 0..rows.len() {
                    prop_assert_eq!(rows[i][j], rows[j][i]);
                    if let Some(c) = rows[i][j] {
                        prop_assert!((-1.0..=1.0).contains(&c));
                    }
                }
            }
        }
    }
}
