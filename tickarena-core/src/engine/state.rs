//! Run configuration and run result types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ledger::RejectedOrder;
use crate::domain::{Balances, Prices, Trade};

/// Default fee: 2 basis points.
pub const DEFAULT_FEE_BPS: f64 = 2.0;

/// Default fiat symbol.
pub const DEFAULT_FIAT: &str = "fiat";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunConfigError {
    #[error("fee rate must be in [0, 1), got {0}")]
    InvalidFeeRate(f64),

    #[error("initial balance for '{asset}' must be finite and non-negative, got {quantity}")]
    InvalidBalance { asset: String, quantity: f64 },

    #[error("fiat symbol must not be empty")]
    EmptyFiat,

    #[error("timeframe must be positive, got {0} ms")]
    InvalidInterval(i64),
}

/// Immutable settings for one run, shared by the engine, ledger and scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Asset all valuations are expressed in.
    pub fiat: String,
    /// Fractional fee applied to both sides, in `[0, 1)`.
    pub fee_rate: f64,
    pub initial_balances: Balances,
    /// Candle interval used for annualization. `None` means infer from data.
    pub interval_ms: Option<i64>,
    pub risk_free_rate: f64,
}

impl RunConfig {
    pub fn new(fiat: impl Into<String>, fee_rate: f64, initial_balances: Balances) -> Self {
        Self {
            fiat: fiat.into(),
            fee_rate,
            initial_balances,
            interval_ms: None,
            risk_free_rate: 0.0,
        }
    }

    /// Build from a fee given in basis points (`2.0` → `0.0002`).
    pub fn from_bps(fiat: impl Into<String>, fee_bps: f64, initial_balances: Balances) -> Self {
        Self::new(fiat, fee_bps / 10_000.0, initial_balances)
    }

    pub fn with_interval(mut self, interval_ms: i64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        if self.fiat.trim().is_empty() {
            return Err(RunConfigError::EmptyFiat);
        }
        if !(self.fee_rate.is_finite() && (0.0..1.0).contains(&self.fee_rate)) {
            return Err(RunConfigError::InvalidFeeRate(self.fee_rate));
        }
        if let Some((asset, quantity)) = self
            .initial_balances
            .iter()
            .find(|(_, q)| !(q.is_finite() && *q >= 0.0))
        {
            return Err(RunConfigError::InvalidBalance {
                asset: asset.to_string(),
                quantity,
            });
        }
        if let Some(ms) = self.interval_ms {
            if ms <= 0 {
                return Err(RunConfigError::InvalidInterval(ms));
            }
        }
        Ok(())
    }
}

impl Default for RunConfig {
    /// 10 000 fiat, no tokens, 2 bps.
    fn default() -> Self {
        Self::from_bps(
            DEFAULT_FIAT,
            DEFAULT_FEE_BPS,
            [(DEFAULT_FIAT, 10_000.0), ("token_1", 0.0), ("token_2", 0.0)]
                .into_iter()
                .collect(),
        )
    }
}

/// Portfolio value in fiat at one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: f64,
}

/// Everything the engine produced, handed to the scorer.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub strategy: String,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub rejections: Vec<RejectedOrder>,
    pub initial_balances: Balances,
    pub final_balances: Balances,
    /// First observed close per pair.
    pub initial_prices: Prices,
    /// Last-known close per pair.
    pub final_prices: Prices,
    pub snapshot_count: usize,
}

impl RunResult {
    pub fn final_equity(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.equity)
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}
