//! TickArena Runner: backtest orchestration, scoring and artifacts.
//!
//! This crate builds on `tickarena-core` to provide:
//! - TOML run configuration and content-addressed run ids
//! - Data loading with dataset hashing
//! - Single and batch (parallel) backtest runners
//! - Metrics and the composite scoring report
//! - JSON/CSV artifact export

pub mod batch;
pub mod config;
pub mod export;
pub mod metrics;
pub mod report;
pub mod runner;

pub use batch::{run_batch, run_batch_on, BatchOptions};
pub use config::{parse_timeframe, BacktestConfig, BacktestSection, ConfigError, RunId};
pub use export::{save_artifacts, RunManifest};
pub use report::{score, score_run, EmptyRunError, ScoreParams, ScoringReport};
pub use runner::{
    load_data, run_backtest_from_data, run_single_backtest, BacktestResult, LoadedData, RunError,
    SCHEMA_VERSION,
};
