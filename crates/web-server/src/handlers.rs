use crate::{AppState, error::AppError};
use analyzer::{AnalysisReport, RankedSymbol, RiskProfile, SymbolAnalysis};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use core_types::{DatedSeries, Observation, Sector, Symbol};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Optional inclusive date bounds for series endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    fn validate(&self) -> Result<(), AppError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(AppError::InvalidInput(format!(
                "start {start} is after end {end}"
            ))),
            _ => Ok(()),
        }
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

#[derive(Debug, Serialize)]
pub struct SymbolSummary {
    pub symbol: Symbol,
    pub sector: Option<Sector>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub returns: usize,
    pub cumulative_return: f64,
    pub sharpe_ratio: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub symbol: Symbol,
    /// Present for rolling volatility only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    pub observations: Vec<Observation>,
}

fn find<'a>(report: &'a AnalysisReport, symbol: &str) -> Result<&'a SymbolAnalysis, AppError> {
    report
        .analysis(symbol)
        .or_else(|| report.analysis(&symbol.to_uppercase()))
        .ok_or_else(|| AppError::NotFound(symbol.to_string()))
}

fn filtered<S: DatedSeries>(series: &S, range: &DateRange) -> Vec<Observation> {
    series
        .observations()
        .iter()
        .filter(|o| range.contains(o.date))
        .copied()
        .collect()
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # GET /api/report
pub async fn get_report(State(state): State<Arc<AppState>>) -> Json<Arc<AnalysisReport>> {
    Json(state.report.clone())
}

/// # GET /api/symbols
pub async fn list_symbols(State(state): State<Arc<AppState>>) -> Json<Vec<SymbolSummary>> {
    let summaries = state
        .report
        .symbols()
        .iter()
        .filter_map(|symbol| state.report.analysis(symbol))
        .map(|analysis| SymbolSummary {
            symbol: analysis.risk.symbol.clone(),
            sector: analysis.sector,
            first_date: analysis.returns.first().map(|o| o.date),
            last_date: analysis.returns.last().map(|o| o.date),
            returns: analysis.returns.len(),
            cumulative_return: analysis.risk.cumulative_return,
            sharpe_ratio: analysis.risk.sharpe_ratio,
        })
        .collect();
    Json(summaries)
}

/// # GET /api/symbols/:symbol/returns
pub async fn get_returns(
    Path(symbol): Path<String>,
    Query(range): Query<DateRange>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesResponse>, AppError> {
    range.validate()?;
    let analysis = find(&state.report, &symbol)?;
    Ok(Json(SeriesResponse {
        symbol: analysis.returns.symbol().to_string(),
        window: None,
        observations: filtered(&analysis.returns, &range),
    }))
}

/// # GET /api/symbols/:symbol/volatility
pub async fn get_volatility(
    Path(symbol): Path<String>,
    Query(range): Query<DateRange>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesResponse>, AppError> {
    range.validate()?;
    let analysis = find(&state.report, &symbol)?;
    Ok(Json(SeriesResponse {
        symbol: analysis.volatility.symbol().to_string(),
        window: Some(analysis.volatility.window()),
        observations: filtered(&analysis.volatility, &range),
    }))
}

/// # GET /api/symbols/:symbol/risk
pub async fn get_risk(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RiskProfile>, AppError> {
    let analysis = find(&state.report, &symbol)?;
    Ok(Json(analysis.risk.clone()))
}

/// # GET /api/correlations
pub async fn get_correlations(
    State(state): State<Arc<AppState>>,
) -> Json<analyzer::CorrelationMatrix> {
    Json(state.report.correlation().clone())
}

/// # GET /api/ranking
pub async fn get_ranking(State(state): State<Arc<AppState>>) -> Json<Vec<RankedSymbol>> {
    Json(state.report.ranking().to_vec())
}
