//! Snapshot-by-snapshot event loop: the heart of the backtesting engine.
//!
//! Per snapshot:
//! 1. Mark-to-market: update last-known closes, record equity
//! 2. Decide: call the strategy once with a read-only view and balances
//! 3. Execute: fill the order (if any) at this snapshot's close, or record the rejection
//!
//! Equity at step `t` reflects fills through `t − 1`; an order placed at `t`
//! shows up in the equity of `t + 1`.
//!
//! The price book starts seeded with each pair's first close in the dataset, so
//! a pair that only starts trading later is valued at that close from step 0
//! rather than at zero. Orders still need the pair in the current snapshot.

use std::collections::BTreeSet;
use tracing::{info, warn};

use super::ledger::{Ledger, OrderRejected};
use super::state::{EquityPoint, RunConfig, RunConfigError, RunResult};
use super::valuation::{unvalued_assets, PriceBook};
use crate::data::Timeline;
use crate::domain::{MarketView, OrderIntent, Pair, Prices};
use crate::strategy::Strategy;

/// Drives one strategy over one timeline.
#[derive(Debug, Clone)]
pub struct Engine {
    config: RunConfig,
}

impl Engine {
    /// Fails on a config the ledger could never honour: bad fee rate,
    /// negative or non-finite balances, empty fiat or non-positive interval.
    pub fn new(config: &RunConfig) -> Result<Self, RunConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the full timeline. Rejected orders are recorded, never fatal.
    pub fn run(&self, timeline: &Timeline, strategy: &mut dyn Strategy) -> RunResult {
        let config = &self.config;
        info!(
            strategy = strategy.name(),
            snapshots = timeline.len(),
            pairs = timeline.pairs.len(),
            fee_rate = config.fee_rate,
            "starting run"
        );

        let mut ledger = Ledger::new(config.initial_balances.clone());
        let initial_prices: Prices = timeline.first_closes();
        let mut book = PriceBook::seeded(&config.fiat, initial_prices.clone());
        let mut equity_curve = Vec::with_capacity(timeline.len());
        let mut warned_unvalued: BTreeSet<String> = BTreeSet::new();

        for snapshot in timeline.iter() {
            // Step 1: mark-to-market
            book.update(snapshot);
            for asset in unvalued_assets(ledger.balances(), book.prices(), &config.fiat) {
                if warned_unvalued.insert(asset.to_string()) {
                    warn!(asset, timestamp = snapshot.timestamp, "no fiat conversion path; valued at zero");
                }
            }
            equity_curve.push(EquityPoint {
                timestamp: snapshot.timestamp,
                equity: book.portfolio_value(ledger.balances()),
            });

            // Step 2: decide
            let view = MarketView::new(snapshot, config.fee_rate);
            let Some(order) = strategy.on_tick(&view, ledger.balances()) else {
                continue;
            };

            // Step 3: execute
            execute(&mut ledger, &book, &order, snapshot.timestamp, snapshot.close(&order.pair), config.fee_rate);
        }

        let final_prices = book.prices().clone();
        let (final_balances, trades, rejections) = ledger.into_parts();

        info!(
            strategy = strategy.name(),
            trades = trades.len(),
            rejected = rejections.len(),
            final_equity = equity_curve.last().map(|p| p.equity).unwrap_or(0.0),
            "run finished"
        );

        RunResult {
            strategy: strategy.name().to_string(),
            equity_curve,
            trades,
            rejections,
            initial_balances: config.initial_balances.clone(),
            final_balances,
            initial_prices,
            final_prices,
            snapshot_count: timeline.len(),
        }
    }
}

/// Convenience wrapper: `Engine::new(config)?.run(timeline, strategy)`.
pub fn run_backtest(
    timeline: &Timeline,
    config: &RunConfig,
    strategy: &mut dyn Strategy,
) -> Result<RunResult, RunConfigError> {
    Ok(Engine::new(config)?.run(timeline, strategy))
}

fn execute(
    ledger: &mut Ledger,
    book: &PriceBook,
    order: &OrderIntent,
    timestamp: i64,
    price: Option<f64>,
    fee_rate: f64,
) {
    let Some(price) = price else {
        ledger.reject(order, timestamp, OrderRejected::NoPrice { pair: order.pair.clone() });
        return;
    };
    if ledger.apply(order, timestamp, price, fee_rate).is_err() {
        return;
    }

    // Accepted, so the pair parsed.
    let quote = Pair::parse(&order.pair).map(|p| p.quote);
    match quote.as_deref().and_then(|q| book.fiat_rate(q)) {
        Some(rate) => ledger.convert_last_trade(rate),
        None => {
            // Quote units must not leak into fiat totals.
            ledger.convert_last_trade(0.0);
            warn!(
                pair = %order.pair,
                timestamp,
                "no fiat rate for quote asset; trade excluded from fiat turnover and fees"
            );
        }
    }
}
