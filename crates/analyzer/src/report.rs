use crate::error::ReportBuildError;
use analytics::{
    CorrelationEngine, CorrelationMatrix, DescriptiveStats, DrawdownSummary, ReturnCalculator,
    RiskMetricsEngine, Trend, cumulative_returns, normalized_prices,
};
use chrono::{DateTime, Utc};
use configuration::{AnalysisParams, Config};
use core_types::{
    DatedSeries, Observation, PriceSeries, RawObservation, ReturnSeries, RollingVolatility, Sector,
    Symbol,
};
use price_store::PriceSeriesStore;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Risk and performance figures for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskProfile {
    pub symbol: Symbol,
    /// Mean daily return.
    pub mean_return: f64,
    /// Sample standard deviation of daily returns.
    pub std_return: f64,
    /// `None` when the return series is flat.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// Compounded return over the whole series.
    pub cumulative_return: f64,
    /// Most recent rolling volatility value.
    pub latest_volatility: Option<f64>,
    /// Against the configured benchmark, when it is part of the run.
    pub beta: Option<f64>,
    pub drawdown: DrawdownSummary,
    pub trend: Trend,
}

/// Everything derived for one symbol in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAnalysis {
    pub sector: Option<Sector>,
    pub returns: ReturnSeries,
    pub volatility: RollingVolatility,
    /// Cumulative return as of each date.
    pub growth: Vec<Observation>,
    /// Prices rebased to 100 on the first date.
    pub normalized_prices: Vec<Observation>,
    pub return_stats: DescriptiveStats,
    pub risk: RiskProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSymbol {
    pub rank: usize,
    pub symbol: Symbol,
    pub sharpe_ratio: Option<f64>,
    pub cumulative_return: f64,
}

/// The immutable result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    params: AnalysisParams,
    symbols: Vec<Symbol>,
    analyses: BTreeMap<Symbol, SymbolAnalysis>,
    correlation: CorrelationMatrix,
    ranking: Vec<RankedSymbol>,
}

impl AnalysisReport {
    /// Runs the pipeline over already-loaded prices.
    ///
    /// Every requested symbol must be present in `store`. Any component failure
    /// aborts the build; no partial report is returned.
    pub fn build<S: AsRef<str>>(
        symbols: &[S],
        store: &PriceSeriesStore,
        config: &Config,
    ) -> Result<Self, ReportBuildError> {
        let symbols = dedupe(symbols);
        if symbols.is_empty() {
            return Err(ReportBuildError::NoSymbols);
        }
        store.ensure_ready(&symbols).map_err(|e| ReportBuildError::Load {
            symbol: e.symbol().to_string(),
            source: e,
        })?;

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, symbols = ?symbols, "Building analysis report");

        let params = config.analysis.clone();
        let calculator = ReturnCalculator::new();
        let risk_engine = RiskMetricsEngine::new(params.clone());

        let mut returns: BTreeMap<Symbol, ReturnSeries> = BTreeMap::new();
        for symbol in &symbols {
            let prices = store.get(symbol).map_err(|e| ReportBuildError::Load {
                symbol: symbol.clone(),
                source: e,
            })?;
            let series = calculator.compute(prices).map_err(|e| analysis_error(symbol, e))?;
            returns.insert(symbol.clone(), series);
        }

        let correlation = CorrelationEngine::new(params.correlation_method)
            .correlation_matrix(symbols.iter().filter_map(|s| returns.get(s)))
            .map_err(|e| ReportBuildError::Correlation {
                symbols: symbols.clone(),
                source: e,
            })?;

        let benchmark = params
            .benchmark
            .as_ref()
            .and_then(|b| returns.get(b));
        if let (Some(name), None) = (&params.benchmark, benchmark) {
            tracing::warn!(benchmark = %name, "Benchmark is not part of this run; betas omitted");
        }

        let mut analyses = BTreeMap::new();
        for symbol in &symbols {
            let prices = store.get(symbol).map_err(|e| ReportBuildError::Load {
                symbol: symbol.clone(),
                source: e,
            })?;
            let Some(series) = returns.get(symbol).cloned() else {
                continue;
            };
            let analysis = analyse_symbol(&risk_engine, prices, series, benchmark, config)
                .map_err(|e| analysis_error(symbol, e))?;
            analyses.insert(symbol.clone(), analysis);
        }

        let ranking = rank_by_sharpe(&symbols, &analyses);

        tracing::info!(
            %run_id,
            symbols = symbols.len(),
            common_dates = correlation.common_dates(),
            "Analysis report built"
        );

        Ok(Self {
            run_id,
            generated_at: Utc::now(),
            params,
            symbols,
            analyses,
            correlation,
            ranking,
        })
    }

    /// Loads `raw` into a fresh store under `config.cleaning`, then builds.
    ///
    /// A requested symbol without raw observations fails as not found.
    pub fn build_from_raw<S: AsRef<str>>(
        symbols: &[S],
        raw: &HashMap<Symbol, Vec<RawObservation>>,
        config: &Config,
    ) -> Result<Self, ReportBuildError> {
        let mut store = PriceSeriesStore::new(config.cleaning.clone());
        for symbol in dedupe(symbols) {
            let observations = raw.get(&symbol).ok_or_else(|| ReportBuildError::Load {
                symbol: symbol.clone(),
                source: price_store::StoreError::NotFound {
                    symbol: symbol.clone(),
                },
            })?;
            store
                .load(&symbol, observations)
                .map_err(|e| ReportBuildError::Load {
                    symbol: symbol.clone(),
                    source: e,
                })?;
        }
        Self::build(symbols, &store, config)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Symbols in the order they were requested.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn analysis(&self, symbol: &str) -> Option<&SymbolAnalysis> {
        self.analyses.get(symbol)
    }

    pub fn returns(&self, symbol: &str) -> Option<&ReturnSeries> {
        self.analysis(symbol).map(|a| &a.returns)
    }

    pub fn volatility(&self, symbol: &str) -> Option<&RollingVolatility> {
        self.analysis(symbol).map(|a| &a.volatility)
    }

    pub fn risk_profile(&self, symbol: &str) -> Option<&RiskProfile> {
        self.analysis(symbol).map(|a| &a.risk)
    }

    /// Risk profiles in request order.
    pub fn risk_profiles(&self) -> impl Iterator<Item = &RiskProfile> {
        self.symbols.iter().filter_map(|s| self.risk_profile(s))
    }

    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Symbols ordered by Sharpe ratio, undefined ratios last.
    pub fn ranking(&self) -> &[RankedSymbol] {
        &self.ranking
    }

    /// The symbol with the highest cumulative return.
    pub fn best_performer(&self) -> Option<&RiskProfile> {
        self.risk_profiles()
            .max_by(|a, b| a.cumulative_return.total_cmp(&b.cumulative_return))
    }

    /// The symbol with the lowest cumulative return.
    pub fn worst_performer(&self) -> Option<&RiskProfile> {
        self.risk_profiles()
            .min_by(|a, b| a.cumulative_return.total_cmp(&b.cumulative_return))
    }
}

fn dedupe<S: AsRef<str>>(symbols: &[S]) -> Vec<Symbol> {
    let mut unique: Vec<Symbol> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let symbol = symbol.as_ref();
        if !unique.iter().any(|s| s == symbol) {
            unique.push(symbol.to_string());
        }
    }
    unique
}

fn analysis_error(symbol: &str, source: analytics::AnalyticsError) -> ReportBuildError {
    ReportBuildError::Analysis {
        symbol: symbol.to_string(),
        source,
    }
}

fn analyse_symbol(
    engine: &RiskMetricsEngine,
    prices: &PriceSeries,
    returns: ReturnSeries,
    benchmark: Option<&ReturnSeries>,
    config: &Config,
) -> Result<SymbolAnalysis, analytics::AnalyticsError> {
    let params = engine.params();
    let values = returns.values();
    let return_stats = DescriptiveStats::from_values(&values).ok_or_else(|| {
        analytics::AnalyticsError::InsufficientData {
            symbol: returns.symbol().to_string(),
            needed: 2,
            actual: 0,
        }
    })?;

    let volatility = engine.rolling_volatility(&returns, params.volatility_window)?;
    let sharpe_ratio = engine.sharpe_ratio(&returns, params.risk_free_rate)?;
    let drawdown = engine.drawdown_details(prices)?;
    let annualized_return = engine.annualized_return(&returns)?;
    let annualized_volatility = engine.annualized_volatility(&returns)?;
    let trend = engine.trend(prices)?;
    let beta = match benchmark {
        Some(b) => engine.beta(&returns, b)?,
        None => None,
    };

    let growth = cumulative_returns(&returns);
    let risk = RiskProfile {
        symbol: returns.symbol().to_string(),
        mean_return: return_stats.mean,
        std_return: return_stats.std_dev.unwrap_or(0.0),
        sharpe_ratio,
        max_drawdown: drawdown.max_drawdown,
        annualized_return,
        annualized_volatility,
        cumulative_return: growth.last().map(|o| o.value).unwrap_or(0.0),
        latest_volatility: volatility.last().map(|o| o.value),
        beta,
        drawdown,
        trend,
    };

    Ok(SymbolAnalysis {
        sector: config.universe.sector_of(returns.symbol()),
        normalized_prices: normalized_prices(prices, 100.0),
        growth,
        volatility,
        return_stats,
        risk,
        returns,
    })
}

fn rank_by_sharpe(
    symbols: &[Symbol],
    analyses: &BTreeMap<Symbol, SymbolAnalysis>,
) -> Vec<RankedSymbol> {
    let mut profiles: Vec<&RiskProfile> = symbols
        .iter()
        .filter_map(|s| analyses.get(s).map(|a| &a.risk))
        .collect();
    profiles.sort_by(|a, b| match (a.sharpe_ratio, b.sharpe_ratio) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    profiles
        .into_iter()
        .enumerate()
        .map(|(idx, p)| RankedSymbol {
            rank: idx + 1,
            symbol: p.symbol.clone(),
            sharpe_ratio: p.sharpe_ratio,
            cumulative_return: p.cumulative_return,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn raw_series(values: &[f64]) -> Vec<RawObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| RawObservation::new(start + Duration::days(i as i64), *v))
            .collect()
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.analysis.volatility_window = 3;
        config.cleaning.remove_outliers = false;
        config
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        assert_eq!(dedupe(&["A", "B", "A", "C"]), vec!["A", "B", "C"]);
    }

    #[test]
    fn flat_sharpe_ranks_last() {
        let mut raw = HashMap::new();
        raw.insert("UP".to_string(), raw_series(&[10.0, 10.2, 10.1, 10.4, 10.6, 10.5]));
        raw.insert("STEADY".to_string(), raw_series(&[8.0, 8.0, 8.0, 8.0, 8.0, 8.0]));
        raw.insert("DOWN".to_string(), raw_series(&[20.0, 19.5, 19.8, 19.0, 18.7, 18.9]));

        let report =
            AnalysisReport::build_from_raw(&["STEADY", "UP"], &raw, &small_config()).unwrap();
        let order: Vec<&str> = report.ranking().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["UP", "STEADY"]);
        assert_eq!(report.ranking()[1].sharpe_ratio, None);

        let report =
            AnalysisReport::build_from_raw(&["DOWN", "UP"], &raw, &small_config()).unwrap();
        let order: Vec<&str> = report.ranking().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["UP", "DOWN"]);
        assert_eq!(report.best_performer().unwrap().symbol, "UP");
        assert_eq!(report.worst_performer().unwrap().symbol, "DOWN");
    }
}
