//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! data = ["data/test.csv"]
//! fiat = "fiat"
//! fee_bps = 2.0
//! timeframe = "1m"
//!
//! [balances]
//! fiat = 10000.0
//!
//! [strategy]
//! type = "mean_reversion"
//! pair = "token_1/fiat"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickarena_core::domain::Balances;
use tickarena_core::engine::{RunConfig, RunConfigError, DEFAULT_FEE_BPS, DEFAULT_FIAT};
use tickarena_core::strategy::StrategySpec;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unknown timeframe '{0}' (expected e.g. 1m, 15m, 1h, 1d)")]
    UnknownTimeframe(String),

    #[error("no data files configured")]
    NoData,

    #[error(transparent)]
    Invalid(#[from] RunConfigError),
}

/// `[backtest]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    /// Merged CSV/Parquet candle files.
    #[serde(default)]
    pub data: Vec<PathBuf>,
    #[serde(default = "default_fiat")]
    pub fiat: String,
    #[serde(default = "default_fee_bps")]
    pub fee_bps: f64,
    /// Candle granularity for annualization; inferred from data when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub risk_free_rate: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            fiat: default_fiat(),
            fee_bps: default_fee_bps(),
            timeframe: None,
            risk_free_rate: 0.0,
        }
    }
}

fn default_fiat() -> String {
    DEFAULT_FIAT.to_string()
}

fn default_fee_bps() -> f64 {
    DEFAULT_FEE_BPS
}

fn default_balances() -> BTreeMap<String, f64> {
    [(DEFAULT_FIAT, 10_000.0), ("token_1", 0.0), ("token_2", 0.0)]
        .into_iter()
        .map(|(a, q)| (a.to_string(), q))
        .collect()
}

fn default_strategy() -> StrategySpec {
    StrategySpec::new("hold")
}

/// Complete configuration for one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default = "default_balances")]
    pub balances: BTreeMap<String, f64>,
    #[serde(default = "default_strategy")]
    pub strategy: StrategySpec,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestSection::default(),
            balances: default_balances(),
            strategy: default_strategy(),
        }
    }
}

impl BacktestConfig {
    /// Load from a TOML file. Relative data and order-log paths resolve
    /// against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for data in &mut self.backtest.data {
            if data.is_relative() {
                *data = base.join(&*data);
            }
        }
        if let Some(orders) = &mut self.strategy.orders {
            if orders.is_relative() {
                *orders = base.join(&*orders);
            }
        }
    }

    /// Check everything that can be checked without loading data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.data.is_empty() {
            return Err(ConfigError::NoData);
        }
        self.run_config()?;
        Ok(())
    }

    /// Build the engine's immutable run configuration.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let balances: Balances = self.balances.clone().into();
        let mut config = RunConfig::from_bps(&self.backtest.fiat, self.backtest.fee_bps, balances)
            .with_risk_free_rate(self.backtest.risk_free_rate);
        if let Some(tf) = &self.backtest.timeframe {
            config = config.with_interval(parse_timeframe(tf)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs (and data) share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

/// Parse a candle timeframe such as `1m`, `15m`, `4h`, `1d`, `30s` into milliseconds.
pub fn parse_timeframe(raw: &str) -> Result<i64, ConfigError> {
    let raw = raw.trim();
    let unknown = || ConfigError::UnknownTimeframe(raw.to_string());
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(unknown)?;
    let (count, unit) = raw.split_at(split);
    let count: i64 = count.parse().map_err(|_| unknown())?;
    let unit_ms = match unit {
        "s" => 1_000,
        "m" | "min" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return Err(unknown()),
    };
    if count <= 0 {
        return Err(unknown());
    }
    Ok(count * unit_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
data = ["data/test.csv"]
fiat = "fiat"
fee_bps = 2.0
timeframe = "1m"

[balances]
fiat = 10000.0
token_1 = 0.0
token_2 = 0.0

[strategy]
type = "mean_reversion"
pair = "token_1/fiat"

[strategy.params]
window = 30
threshold = 2.0
quantity = 0.01
"#;

    #[test]
    fn parses_sample_config() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.backtest.data, vec![PathBuf::from("data/test.csv")]);
        assert_eq!(config.strategy.strategy_type, "mean_reversion");
        assert_eq!(config.strategy.params["window"], 30.0);
        assert!(config.validate().is_ok());

        let run = config.run_config().unwrap();
        assert!((run.fee_rate - 0.0002).abs() < 1e-15);
        assert_eq!(run.interval_ms, Some(60_000));
        assert_eq!(run.initial_balances.get("fiat"), 10_000.0);
    }

    #[test]
    fn defaults_fill_missing_tables() {
        let config = BacktestConfig::from_toml("[backtest]\ndata = [\"x.csv\"]\n").unwrap();
        assert_eq!(config.backtest.fiat, "fiat");
        assert_eq!(config.backtest.fee_bps, 2.0);
        assert_eq!(config.balances["fiat"], 10_000.0);
        assert_eq!(config.strategy.strategy_type, "hold");
    }

    #[test]
    fn rejects_missing_data() {
        let config = BacktestConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoData)));
    }

    #[test]
    fn rejects_bad_fee_and_balance() {
        let mut config = BacktestConfig::from_toml(SAMPLE).unwrap();
        config.backtest.fee_bps = 10_000.0;
        assert!(matches!(config.run_config(), Err(ConfigError::Invalid(_))));

        let mut config = BacktestConfig::from_toml(SAMPLE).unwrap();
        config.balances.insert("token_1".into(), -1.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            BacktestConfig::from_toml("[backtest\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn timeframes() {
        assert_eq!(parse_timeframe("1m").unwrap(), 60_000);
        assert_eq!(parse_timeframe("15m").unwrap(), 900_000);
        assert_eq!(parse_timeframe("4h").unwrap(), 14_400_000);
        assert_eq!(parse_timeframe("1d").unwrap(), 86_400_000);
        assert!(parse_timeframe("m").is_err());
        assert!(parse_timeframe("0m").is_err());
        assert!(parse_timeframe("5y").is_err());
        assert!(parse_timeframe("60").is_err());
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = BacktestConfig::from_toml(SAMPLE).unwrap();
        let mut b = a.clone();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        b.backtest.fee_bps = 3.0;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = BacktestConfig::from_file(&path).unwrap();
        assert_eq!(config.backtest.data[0], dir.path().join("data/test.csv"));
    }
}
