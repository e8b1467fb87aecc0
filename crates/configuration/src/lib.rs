use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalysisParams, CleaningPolicy, Config, CorrelationMethod, DataSettings, LoggingSettings,
    ServerSettings, Universe,
};

/// Loads the application configuration from the `config.toml` file.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads and validates the configuration from `path`.
///
/// The file is optional: missing sections fall back to their defaults.
/// Environment variables prefixed with `PULSE_` override file values, using
/// `__` between nested keys (e.g. `PULSE_ANALYSIS__VOLATILITY_WINDOW=20`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("PULSE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_sections_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [analysis]
            volatility_window = 20
            risk_free_rate = 0.02
            correlation_method = "spearman"

            [cleaning]
            remove_outliers = false

            [universe]
            technology = ["NVDA"]
            financial = ["MS", "C"]
            "#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.analysis.volatility_window, 20);
        assert_eq!(config.analysis.trading_days_per_year, 252);
        assert_eq!(config.analysis.correlation_method, CorrelationMethod::Spearman);
        assert!(!config.cleaning.remove_outliers);
        assert!(config.cleaning.forward_fill);
        assert_eq!(config.universe.symbols(), vec!["NVDA", "MS", "C"]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.analysis, AnalysisParams::default());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cleaning]\niqr_multiplier = 0.0").unwrap();

        let err = load_config_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
