use crate::cleaning::{CleaningSummary, clean};
use crate::error::StoreError;
use configuration::CleaningPolicy;
use core_types::{DatedSeries, PriceSeries, RawObservation, Symbol};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct StoredSeries {
    prices: PriceSeries,
    summary: CleaningSummary,
}

/// Cleaned price histories keyed by symbol.
///
/// Loading takes `&mut self` and reading takes `&self`, so every symbol of a
/// run is written before any analysis borrows the store.
#[derive(Debug, Clone, Default)]
pub struct PriceSeriesStore {
    policy: CleaningPolicy,
    series: BTreeMap<Symbol, StoredSeries>,
}

impl PriceSeriesStore {
    pub fn new(policy: CleaningPolicy) -> Self {
        Self {
            policy,
            series: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> &CleaningPolicy {
        &self.policy
    }

    /// Cleans `raw` and stores the result under `symbol`, replacing any
    /// earlier series for it.
    ///
    /// On failure the store is left unchanged.
    pub fn load(
        &mut self,
        symbol: &str,
        raw: &[RawObservation],
    ) -> Result<&PriceSeries, StoreError> {
        let (prices, summary) = clean(symbol, raw, &self.policy)?;
        tracing::info!(
            symbol,
            observations = prices.len(),
            filled = summary.filled,
            outliers = summary.outliers,
            "Loaded price series"
        );

        self.series
            .insert(symbol.to_string(), StoredSeries { prices, summary });
        self.get(symbol)
    }

    pub fn get(&self, symbol: &str) -> Result<&PriceSeries, StoreError> {
        self.series
            .get(symbol)
            .map(|s| &s.prices)
            .ok_or_else(|| StoreError::NotFound {
                symbol: symbol.to_string(),
            })
    }

    pub fn summary(&self, symbol: &str) -> Result<&CleaningSummary, StoreError> {
        self.series
            .get(symbol)
            .map(|s| &s.summary)
            .ok_or_else(|| StoreError::NotFound {
                symbol: symbol.to_string(),
            })
    }

    /// Confirms every symbol of a run is loaded before analysis starts.
    pub fn ensure_ready<S: AsRef<str>>(&self, symbols: &[S]) -> Result<(), StoreError> {
        for symbol in symbols {
            self.get(symbol.as_ref())?;
        }
        Ok(())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
