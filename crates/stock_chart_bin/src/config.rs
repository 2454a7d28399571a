use alphavantage_api::api::{ALPHAVANTAGE_BASE_API_URL, OutputSize};
use chart_render::chart::RenderOptions;
use dotenvy::dotenv;
use history_analysis::analysis::{AnalysisParams, DEFAULT_DISPLAY_WINDOW, DEFAULT_SMA_PERIOD};
use std::env;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::utils;

const DEFAULT_SYMBOL: &str = "AAPL";
const DEFAULT_OUTPUT: &str = "chart.svg";

#[derive(Debug)]
pub struct Config {
    pub api_key: String,
    pub symbol: String,
    pub output_size: OutputSize,
    pub analysis: AnalysisParams,
    pub output_path: PathBuf,
    pub base_url: String,
    pub render: RenderOptions,
}

impl Config {
    pub fn new() -> Result<Config, Box<dyn Error>> {
        dotenv().ok();
        Config::from_vars(|name| env::var(name).ok())
    }

    /// Builds the config from a variable lookup. Blank values count as unset.
    pub fn from_vars<F>(var: F) -> Result<Config, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| {
            var(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key =
            lookup("ALPHAVANTAGE_API_KEY").ok_or(ConfigError::Missing("ALPHAVANTAGE_API_KEY"))?;

        let raw_symbol =
            lookup("STOCK_CHART_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
        let symbol = utils::sanitize_ticker(raw_symbol.clone());
        if symbol.is_empty() {
            return Err(Box::new(ConfigError::Invalid("STOCK_CHART_SYMBOL", raw_symbol)));
        }

        let output_size = match lookup("STOCK_CHART_OUTPUT_SIZE") {
            Some(raw) => raw.parse::<OutputSize>()?,
            None => OutputSize::default(),
        };

        let sma_period = parse_window(
            lookup("STOCK_CHART_SMA_PERIOD"),
            "STOCK_CHART_SMA_PERIOD",
            DEFAULT_SMA_PERIOD,
        )?;
        let display_window = parse_window(
            lookup("STOCK_CHART_DISPLAY_DAYS"),
            "STOCK_CHART_DISPLAY_DAYS",
            DEFAULT_DISPLAY_WINDOW,
        )?;

        let output_path = PathBuf::from(
            lookup("STOCK_CHART_OUTPUT").unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        );
        let base_url = lookup("STOCK_CHART_BASE_URL")
            .unwrap_or_else(|| ALPHAVANTAGE_BASE_API_URL.to_string());

        let config = Config {
            api_key,
            symbol,
            output_size,
            analysis: AnalysisParams {
                sma_period,
                display_window,
            },
            output_path,
            base_url,
            render: RenderOptions::default(),
        };
        Ok(config)
    }
}

fn parse_window(
    raw: Option<String>,
    name: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let raw = match raw {
        Some(raw) => raw,
        None => return Ok(default),
    };
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid(name, raw)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} is not set", name),
            ConfigError::Invalid(name, value) => {
                write!(f, "{} has invalid value '{}'", name, value)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, Box<dyn Error>> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn config_pass_defaults() {
        let config = config_from(&[("ALPHAVANTAGE_API_KEY", "secret")]).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.output_size, OutputSize::Full);
        assert_eq!(config.analysis, AnalysisParams::default());
        assert_eq!(config.output_path, PathBuf::from("chart.svg"));
        assert_eq!(config.base_url, ALPHAVANTAGE_BASE_API_URL);
    }

    #[test]
    fn config_pass_overrides() {
        let config = config_from(&[
            ("ALPHAVANTAGE_API_KEY", "secret"),
            ("STOCK_CHART_SYMBOL", "msft"),
            ("STOCK_CHART_OUTPUT_SIZE", "compact"),
            ("STOCK_CHART_SMA_PERIOD", "50"),
            ("STOCK_CHART_DISPLAY_DAYS", "90"),
            ("STOCK_CHART_OUTPUT", "out/msft.svg"),
        ])
        .unwrap();
        assert_eq!(config.symbol, "MSFT");
        assert_eq!(config.output_size, OutputSize::Compact);
        assert_eq!(config.analysis.sma_period, 50);
        assert_eq!(config.analysis.display_window, 90);
        assert_eq!(config.output_path, PathBuf::from("out/msft.svg"));
    }

    #[test]
    fn config_pass_blank_values_use_defaults() {
        let config = config_from(&[
            ("ALPHAVANTAGE_API_KEY", "secret"),
            ("STOCK_CHART_SYMBOL", "  "),
            ("STOCK_CHART_SMA_PERIOD", ""),
        ])
        .unwrap();
        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.analysis.sma_period, 20);
    }

    #[test]
    fn config_fail_missing_api_key() {
        let err = config_from(&[]).unwrap_err();
        assert_eq!(err.to_string(), "ALPHAVANTAGE_API_KEY is not set");
    }

    #[test]
    fn config_fail_zero_period() {
        let err = config_from(&[
            ("ALPHAVANTAGE_API_KEY", "secret"),
            ("STOCK_CHART_SMA_PERIOD", "0"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("STOCK_CHART_SMA_PERIOD"));
    }

    #[test]
    fn config_fail_bad_output_size() {
        let result = config_from(&[
            ("ALPHAVANTAGE_API_KEY", "secret"),
            ("STOCK_CHART_OUTPUT_SIZE", "tiny"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_fail_symbol_sanitized_away() {
        let result = config_from(&[
            ("ALPHAVANTAGE_API_KEY", "secret"),
            ("STOCK_CHART_SYMBOL", "$$$"),
        ]);
        assert!(result.is_err());
    }
}
