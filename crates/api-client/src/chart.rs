//! The JSON shape of the `/v8/finance/chart` endpoint and its conversion into
//! raw observations.

use crate::error::ApiError;
use chrono::{DateTime, NaiveDate};
use core_types::RawObservation;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Seconds east of UTC for the listing exchange.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Parses a chart response body into daily closes.
///
/// Timestamps are converted to exchange-local dates. A `null` close becomes a
/// missing marker; it is not dropped. Provider errors and empty results are
/// reported as unavailable data.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<Vec<RawObservation>, ApiError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

    let unavailable = |reason: String| ApiError::DataUnavailable {
        symbol: symbol.to_string(),
        reason,
    };

    if let Some(error) = response.chart.error {
        return Err(unavailable(format!("{}: {}", error.code, error.description)));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| unavailable("empty result".to_string()))?;
    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut observations = Vec::with_capacity(data.timestamp.len());
    for (idx, ts) in data.timestamp.iter().enumerate() {
        let date = local_date(*ts, data.meta.gmtoffset)
            .ok_or_else(|| unavailable(format!("invalid timestamp {ts}")))?;
        let close = closes.get(idx).copied().flatten();
        observations.push(RawObservation { date, close });
    }

    if observations.iter().all(|o| o.close.is_none()) {
        return Err(unavailable("no closing prices in range".to_string()));
    }
    Ok(observations)
}

fn local_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp.checked_add(gmtoffset)?, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_session_timestamps_use_exchange_date() {
        // 2024-01-02 23:30 UTC is still 2024-01-02 in New York
        let ts = 1_704_238_200;
        assert_eq!(
            local_date(ts, -18_000),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[test]
    fn malformed_body_is_a_deserialization_error() {
        let err = parse_chart_response("AAPL", "<html>").unwrap_err();
        assert!(matches!(err, ApiError::Deserialization { .. }));
        assert_eq!(err.symbol(), Some("AAPL"));
    }
}
