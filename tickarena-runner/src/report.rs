//! Scoring report: the single summary derived from a finished run.
//!
//! Composite score:
//!
//! ```text
//! score = 0.7·sharpe − 0.2·|max_drawdown| − 0.1·(turnover / 1_000_000)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickarena_core::domain::{Balances, Prices, Trade};
use tickarena_core::engine::{portfolio_value, EquityPoint, RunResult};

use crate::metrics::{max_drawdown, periods_per_year, pnl, sharpe_ratio, total_fees, turnover};

pub const SHARPE_WEIGHT: f64 = 0.7;
pub const DRAWDOWN_WEIGHT: f64 = 0.2;
pub const TURNOVER_WEIGHT: f64 = 0.1;
/// Turnover is penalized per million units of fiat traded.
pub const TURNOVER_SCALE: f64 = 1_000_000.0;

/// Fallback candle interval when neither config nor data provide one.
pub const DEFAULT_INTERVAL_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot score an empty run (no equity points)")]
pub struct EmptyRunError;

/// Inputs to scoring that are not part of the run itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreParams {
    pub fiat: String,
    /// Candle interval used for annualization.
    pub interval_ms: i64,
    pub risk_free_rate: f64,
}

impl ScoreParams {
    pub fn new(fiat: impl Into<String>, interval_ms: i64) -> Self {
        Self {
            fiat: fiat.into(),
            interval_ms,
            risk_free_rate: 0.0,
        }
    }

    pub fn periods_per_year(&self) -> f64 {
        periods_per_year(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlReport {
    pub absolute: f64,
    pub percentage: f64,
    pub initial_equity: f64,
    pub final_equity: f64,
}

/// What the initial balances would be worth had the strategy never traded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HodlPnl {
    pub initial_value: f64,
    pub final_value: f64,
    pub absolute: f64,
    pub percentage: f64,
    /// Strategy final equity minus HODL final value.
    pub strategy_excess: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub sharpe_contribution: f64,
    pub drawdown_penalty: f64,
    pub turnover_penalty: f64,
}

impl ScoreComponents {
    pub fn new(sharpe: f64, max_drawdown: f64, turnover: f64) -> Self {
        Self {
            sharpe_contribution: SHARPE_WEIGHT * sharpe,
            drawdown_penalty: DRAWDOWN_WEIGHT * max_drawdown.abs(),
            turnover_penalty: TURNOVER_WEIGHT * (turnover / TURNOVER_SCALE),
        }
    }

    pub fn total(&self) -> f64 {
        self.sharpe_contribution - self.drawdown_penalty - self.turnover_penalty
    }
}

/// Aggregate scoring for a single backtest run. The equity curve is exported separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringReport {
    pub score: f64,
    pub pnl: PnlReport,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub turnover: f64,
    pub trade_count: usize,
    pub rejected_order_count: usize,
    pub total_fees_paid: f64,
    pub hodl_pnl: HodlPnl,
    pub score_components: ScoreComponents,
    pub initial_balances: Balances,
    pub final_balances: Balances,
    pub initial_prices: Prices,
    pub final_prices: Prices,
}

/// Score a run from its raw parts.
#[allow(clippy::too_many_arguments)]
pub fn score(
    equity_curve: &[EquityPoint],
    trades: &[Trade],
    initial_balances: &Balances,
    final_balances: &Balances,
    initial_prices: &Prices,
    final_prices: &Prices,
    params: &ScoreParams,
) -> Result<ScoringReport, EmptyRunError> {
    if equity_curve.is_empty() {
        return Err(EmptyRunError);
    }
    let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
    let initial_equity = equity[0];
    let final_equity = equity[equity.len() - 1];

    let (absolute, percentage) = pnl(&equity);
    let sharpe = sharpe_ratio(&equity, params.periods_per_year(), params.risk_free_rate);
    let max_dd = max_drawdown(&equity);
    let turnover = turnover(trades);
    let components = ScoreComponents::new(sharpe, max_dd, turnover);

    let hodl_initial = portfolio_value(initial_balances, initial_prices, &params.fiat);
    let hodl_final = portfolio_value(initial_balances, final_prices, &params.fiat);
    let (hodl_abs, hodl_pct) = pnl(&[hodl_initial, hodl_final]);

    Ok(ScoringReport {
        score: components.total(),
        pnl: PnlReport {
            absolute,
            percentage,
            initial_equity,
            final_equity,
        },
        sharpe,
        max_drawdown: max_dd,
        turnover,
        trade_count: trades.len(),
        rejected_order_count: 0,
        total_fees_paid: total_fees(trades),
        hodl_pnl: HodlPnl {
            initial_value: hodl_initial,
            final_value: hodl_final,
            absolute: hodl_abs,
            percentage: hodl_pct,
            strategy_excess: final_equity - hodl_final,
        },
        score_components: components,
        initial_balances: initial_balances.clone(),
        final_balances: final_balances.clone(),
        initial_prices: initial_prices.clone(),
        final_prices: final_prices.clone(),
    })
}

/// Score a finished engine run, including its rejection count.
pub fn score_run(result: &RunResult, params: &ScoreParams) -> Result<ScoringReport, EmptyRunError> {
    let mut report = score(
        &result.equity_curve,
        &result.trades,
        &result.initial_balances,
        &result.final_balances,
        &result.initial_prices,
        &result.final_prices,
        params,
    )?;
    report.rejected_order_count = result.rejections.len();
    Ok(report)
}
