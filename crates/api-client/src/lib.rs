use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use configuration::DataSettings;
use core_types::RawObservation;

pub mod chart;
pub mod error;

// --- Public API ---
pub use chart::parse_chart_response;

/// The interface for anything that can supply daily closing prices.
///
/// The CLI only talks to this trait, so a cache-backed or fixture source can
/// stand in for the network.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches daily closes for `symbol` between `start` and `end`, inclusive.
    ///
    /// Missing days reported by the provider are returned as missing markers.
    async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawObservation>, ApiError>;
}

/// A `PriceSource` backed by the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0")
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &DataSettings) -> Result<Self, ApiError> {
        Self::new(settings.provider_url.clone())
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawObservation>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive
        let period2 = (end + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        tracing::debug!(symbol, %start, %end, "Fetching daily closes");

        let request_err = |source| ApiError::Request {
            symbol: symbol.to_string(),
            source,
        };
        let response = self
            .client
            .get(&url)
            .query(&[
                ("interval", "1d".to_string()),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
            ])
            .send()
            .await
            .map_err(request_err)?;

        let status = response.status();
        let body = response.text().await.map_err(request_err)?;
        if !status.is_success() && !body.contains("\"chart\"") {
            return Err(ApiError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let mut observations = parse_chart_response(symbol, &body)?;
        observations.retain(|o| o.date >= start && o.date <= end);
        if observations.is_empty() {
            return Err(ApiError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no observations between {start} and {end}"),
            });
        }

        tracing::info!(symbol, observations = observations.len(), "Fetched daily closes");
        Ok(observations)
    }
}
