//! Factory: converts a `StrategySpec` into a runtime trait object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::mean_reversion::{self, MeanReversion};
use super::replay::{Replay, ReplayError};
use super::triangle::{self, TriangleArbitrage};
use super::{Hold, Strategy};
use crate::domain::Pair;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown strategy type: {0}")]
    UnknownStrategy(String),
    #[error("Strategy '{strategy}' requires a pair")]
    MissingPair { strategy: String },
    #[error("Strategy '{strategy}': malformed pair '{pair}'")]
    MalformedPair { strategy: String, pair: String },
    #[error("Strategy 'replay' requires an order log path")]
    MissingOrderLog,
    #[error("Strategy '{strategy}': invalid parameter {name} = {value}")]
    InvalidParam {
        strategy: String,
        name: String,
        value: f64,
    },
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

// ─── Spec ────────────────────────────────────────────────────────────

/// Declarative description of a strategy, as found in a run config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategySpec {
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Traded pair (`mean_reversion`) or cross pair (`triangle_arbitrage`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    /// Common quote asset of a triangle. Defaults to the run's fiat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// Order log for `replay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<PathBuf>,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategySpec {
    pub fn new(strategy_type: impl Into<String>) -> Self {
        Self {
            strategy_type: strategy_type.into(),
            ..Default::default()
        }
    }

    pub fn with_pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = Some(pair.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn param(spec: &StrategySpec, name: &str, default: f64) -> f64 {
    spec.params.get(name).copied().unwrap_or(default)
}

/// Whole, positive count. `30.0` is accepted; `-5`, `2.5` and NaN are not.
fn param_usize(spec: &StrategySpec, name: &str, default: usize) -> Result<usize, FactoryError> {
    let Some(value) = spec.params.get(name).copied() else {
        return Ok(default);
    };
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(FactoryError::InvalidParam {
            strategy: spec.strategy_type.clone(),
            name: name.to_string(),
            value,
        })
    }
}

fn positive_param(spec: &StrategySpec, name: &str, default: f64) -> Result<f64, FactoryError> {
    let value = param(spec, name, default);
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FactoryError::InvalidParam {
            strategy: spec.strategy_type.clone(),
            name: name.to_string(),
            value,
        })
    }
}

fn required_pair(spec: &StrategySpec) -> Result<Pair, FactoryError> {
    let id = spec.pair.as_deref().ok_or_else(|| FactoryError::MissingPair {
        strategy: spec.strategy_type.clone(),
    })?;
    Pair::parse(id).ok_or_else(|| FactoryError::MalformedPair {
        strategy: spec.strategy_type.clone(),
        pair: id.to_string(),
    })
}

// ─── Strategy factory ────────────────────────────────────────────────

/// Create a strategy from its spec. `fiat` is the run's valuation asset.
pub fn create_strategy(spec: &StrategySpec, fiat: &str) -> Result<Box<dyn Strategy>, FactoryError> {
    match spec.strategy_type.as_str() {
        "hold" => Ok(Box::new(Hold)),
        "mean_reversion" => {
            let pair = required_pair(spec)?;
            let window = param_usize(spec, "window", mean_reversion::DEFAULT_WINDOW)?;
            let threshold = positive_param(spec, "threshold", mean_reversion::DEFAULT_THRESHOLD)?;
            let quantity = positive_param(spec, "quantity", mean_reversion::DEFAULT_QUANTITY)?;
            Ok(Box::new(MeanReversion::new(pair.id(), window, threshold, quantity)))
        }
        "triangle_arbitrage" => {
            let cross = required_pair(spec)?;
            let quote = spec.quote.as_deref().unwrap_or(fiat);
            let threshold = positive_param(spec, "threshold", triangle::DEFAULT_THRESHOLD)?;
            let quantity = positive_param(spec, "quantity", triangle::DEFAULT_QUANTITY)?;
            Ok(Box::new(TriangleArbitrage::new(&cross, quote, threshold, quantity)))
        }
        "replay" => {
            let path = spec.orders.as_deref().ok_or(FactoryError::MissingOrderLog)?;
            Ok(Box::new(Replay::from_file(path)?))
        }
        other => Err(FactoryError::UnknownStrategy(other.to_string())),
    }
}
