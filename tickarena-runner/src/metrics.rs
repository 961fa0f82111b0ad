//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! No dependencies on the runner, data pipeline, or engine loop.

use tickarena_core::domain::Trade;

/// Milliseconds in a 365-day year.
pub const MS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Number of candle periods per year for a given interval (1-minute → 525,600).
pub fn periods_per_year(interval_ms: i64) -> f64 {
    if interval_ms <= 0 {
        return 0.0;
    }
    MS_PER_YEAR / interval_ms as f64
}

/// Absolute and percentage PnL from the first to the last equity point.
///
/// Percentage is 0.0 when the first point is zero.
pub fn pnl(equity_curve: &[f64]) -> (f64, f64) {
    let (Some(&first), Some(&last)) = (equity_curve.first(), equity_curve.last()) else {
        return (0.0, 0.0);
    };
    let absolute = last - first;
    let percentage = if first != 0.0 {
        absolute / first * 100.0
    } else {
        0.0
    };
    (absolute, percentage)
}

/// Per-step fractional equity changes. A step from non-positive equity contributes 0.
pub fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized Sharpe ratio.
///
/// Sharpe = (mean(r)·N − rf) / (std(r)·√N) with sample std and N periods per year.
/// Returns 0.0 with fewer than two returns, zero volatility, or a non-finite result.
pub fn sharpe_ratio(equity_curve: &[f64], periods_per_year: f64, risk_free_rate: f64) -> f64 {
    let returns = period_returns(equity_curve);
    if returns.len() < 2 || periods_per_year <= 0.0 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    let annual_return = mean_f64(&returns) * periods_per_year;
    let annual_vol = std * periods_per_year.sqrt();
    let sharpe = (annual_return - risk_free_rate) / annual_vol;
    if sharpe.is_finite() {
        sharpe
    } else {
        0.0
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.25 = 25% drawdown).
///
/// Returns 0.0 if equity never falls below a prior peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Total traded notional in fiat.
pub fn turnover(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.notional_fiat.abs()).sum()
}

/// Total fees paid in fiat.
pub fn total_fees(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.fee_fiat).sum()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
