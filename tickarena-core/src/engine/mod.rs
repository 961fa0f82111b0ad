//! Backtesting engine: snapshot-by-snapshot event loop and supporting infrastructure.
//!
//! The engine consumes a synchronized [`Timeline`](crate::data::Timeline) and a
//! strategy, and produces a [`RunResult`]: equity curve, trade log, rejection
//! log, and the balances and prices at both ends of the run.

pub mod ledger;
pub mod loop_runner;
pub mod state;
pub mod valuation;

pub use ledger::{Ledger, OrderRejected, RejectedOrder};
pub use loop_runner::{run_backtest, Engine};
pub use state::{EquityPoint, RunConfig, RunConfigError, RunResult, DEFAULT_FEE_BPS, DEFAULT_FIAT};
pub use valuation::{fiat_rate, portfolio_value, PriceBook};
