use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::{Sector, Symbol};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its defaults, so an empty `config.toml` is valid.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisParams,
    #[serde(default)]
    pub cleaning: CleaningPolicy,
    #[serde(default)]
    pub universe: Universe,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.cleaning.validate()?;

        if self.universe.symbols().is_empty() {
            return Err(ConfigError::ValidationError(
                "universe must list at least one symbol".to_string(),
            ));
        }

        if let Some(end) = self.data.end_date {
            if end < self.data.start_date {
                return Err(ConfigError::ValidationError(format!(
                    "data.end_date {end} is before data.start_date {}",
                    self.data.start_date
                )));
            }
        }

        Ok(())
    }
}

/// How pairwise co-movement is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
}

/// Parameters for the risk and correlation calculations of one analysis run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Trailing window, in trading days, for rolling volatility.
    pub volatility_window: usize,
    /// Periods per year; the annualization factor is its square root.
    pub trading_days_per_year: u32,
    /// Annual risk-free rate used for the Sharpe ratio (0.02 for 2%).
    pub risk_free_rate: f64,
    pub correlation_method: CorrelationMethod,
    /// Symbol that betas are measured against, when it is part of the run.
    pub benchmark: Option<Symbol>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            volatility_window: 30,
            trading_days_per_year: 252,
            risk_free_rate: 0.0,
            correlation_method: CorrelationMethod::Pearson,
            benchmark: None,
        }
    }
}

impl AnalysisParams {
    pub fn annualization_factor(&self) -> f64 {
        f64::from(self.trading_days_per_year).sqrt()
    }

    pub fn daily_risk_free_rate(&self) -> f64 {
        self.risk_free_rate / f64::from(self.trading_days_per_year)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volatility_window < 2 {
            return Err(ConfigError::ValidationError(format!(
                "analysis.volatility_window must be at least 2, got {}",
                self.volatility_window
            )));
        }
        if self.trading_days_per_year == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.trading_days_per_year must be positive".to_string(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "analysis.risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        Ok(())
    }
}

/// Missing-value and outlier policy applied when raw prices are loaded.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CleaningPolicy {
    /// Fill missing closes with the last valid close; when false they are dropped.
    pub forward_fill: bool,
    /// Run the IQR filter over the one-day return distribution.
    pub remove_outliers: bool,
    /// Fence width, in interquartile ranges, beyond Q1 and Q3.
    pub iqr_multiplier: f64,
}

impl Default for CleaningPolicy {
    fn default() -> Self {
        Self {
            forward_fill: true,
            remove_outliers: true,
            iqr_multiplier: 1.5,
        }
    }
}

impl CleaningPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "cleaning.iqr_multiplier must be a positive number, got {}",
                self.iqr_multiplier
            )));
        }
        Ok(())
    }
}

/// The equities analysed, grouped by sector.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Universe {
    pub technology: Vec<Symbol>,
    pub financial: Vec<Symbol>,
}

impl Default for Universe {
    fn default() -> Self {
        Self {
            technology: vec!["AAPL".into(), "MSFT".into(), "GOOGL".into()],
            financial: vec!["JPM".into(), "BAC".into(), "GS".into()],
        }
    }
}

impl Universe {
    /// All symbols in configuration order, each listed once.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = Vec::new();
        for symbol in self.technology.iter().chain(self.financial.iter()) {
            if !symbols.contains(symbol) {
                symbols.push(symbol.clone());
            }
        }
        symbols
    }

    /// The first sector a symbol is listed under.
    pub fn sector_of(&self, symbol: &str) -> Option<Sector> {
        if self.technology.iter().any(|s| s == symbol) {
            Some(Sector::Technology)
        } else if self.financial.iter().any(|s| s == symbol) {
            Some(Sector::Financial)
        } else {
            None
        }
    }
}

/// Where raw prices come from and where they are cached.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSettings {
    pub cache_dir: PathBuf,
    pub start_date: NaiveDate,
    /// Defaults to today when omitted.
    pub end_date: Option<NaiveDate>,
    pub provider_url: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data/raw"),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end_date: None,
            provider_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

impl DataSettings {
    /// The requested range, with an open end resolved to `today`.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (self.start_date, self.end_date.unwrap_or(today))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "server address {}:{} is invalid: {e}",
                self.host, self.port
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "market-pulse.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.analysis.volatility_window, 30);
        assert!((config.analysis.annualization_factor() - 252f64.sqrt()).abs() < 1e-12);
        assert_eq!(config.universe.symbols().len(), 6);
    }

    #[test]
    fn window_below_two_is_rejected() {
        let mut config = Config::default();
        config.analysis.volatility_window = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("volatility_window"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut config = Config::default();
        config.data.end_date = NaiveDate::from_ymd_opt(2019, 12, 31);
        assert!(config.validate().is_err());
    }

    #[test]
    fn open_ended_range_resolves_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        let mut data = DataSettings::default();
        assert_eq!(data.date_range(today).1, today);

        data.end_date = NaiveDate::from_ymd_opt(2023, 12, 29);
        assert_eq!(data.date_range(today), (data.start_date, data.end_date.unwrap()));
    }

    #[test]
    fn universe_dedupes_and_maps_sectors() {
        let universe = Universe {
            technology: vec!["AAPL".into(), "MSFT".into()],
            financial: vec!["JPM".into(), "AAPL".into()],
        };
        assert_eq!(universe.symbols(), vec!["AAPL", "MSFT", "JPM"]);
        assert_eq!(universe.sector_of("AAPL"), Some(Sector::Technology));
        assert_eq!(universe.sector_of("JPM"), Some(Sector::Financial));
        assert_eq!(universe.sector_of("XOM"), None);
    }

    #[test]
    fn daily_risk_free_rate_divides_by_trading_days() {
        let params = AnalysisParams {
            risk_free_rate: 0.0252,
            ..AnalysisParams::default()
        };
        assert!((params.daily_risk_free_rate() - 0.0001).abs() < 1e-15);
    }
}
