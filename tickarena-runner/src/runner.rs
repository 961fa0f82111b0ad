//! Backtest runner: wires together config, data, strategy, engine, and scoring.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads the configured data files, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes an already synchronized dataset. Used by batch runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use tickarena_core::data::{load_files, synchronize, CandleStore, DataError, Timeline};
use tickarena_core::domain::Trade;
use tickarena_core::engine::{EquityPoint, Engine, RejectedOrder, RunConfig};
use tickarena_core::strategy::{create_strategy, FactoryError};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::report::{score_run, EmptyRunError, ScoreParams, ScoringReport, DEFAULT_INTERVAL_MS};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("strategy error: {0}")]
    Strategy(#[from] FactoryError),
    #[error("scoring error: {0}")]
    Score(#[from] EmptyRunError),
    /// A dataset shared by several batch runs failed to load.
    #[error("dataset {paths} unavailable: {reason}")]
    DatasetUnavailable { paths: String, reason: String },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// A synchronized dataset plus its content hash.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub timeline: Timeline,
    pub dataset_hash: String,
    pub files: Vec<PathBuf>,
}

impl LoadedData {
    /// Synchronize an in-memory store (e.g. synthetic data).
    pub fn from_store(store: &CandleStore) -> Result<Self, DataError> {
        Ok(Self {
            timeline: synchronize(store)?,
            dataset_hash: store.dataset_hash(),
            files: Vec::new(),
        })
    }
}

/// Load, validate and synchronize candle files.
pub fn load_data(files: &[PathBuf]) -> Result<LoadedData, DataError> {
    let store = load_files(files)?;
    let timeline = synchronize(&store)?;
    info!(
        files = files.len(),
        pairs = timeline.pairs.len(),
        candles = store.candle_count(),
        snapshots = timeline.len(),
        "dataset ready"
    );
    Ok(LoadedData {
        timeline,
        dataset_hash: store.dataset_hash(),
        files: files.to_vec(),
    })
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub strategy: String,
    pub config: BacktestConfig,
    /// Candle interval actually used for annualization.
    pub interval_ms: i64,
    pub snapshot_count: usize,
    pub report: ScoringReport,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub rejections: Vec<RejectedOrder>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a single backtest from a BacktestConfig, loading its data files.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let data = load_data(&config.backtest.data)?;
    run_backtest_from_data(config, &data)
}

/// Run a backtest on an already loaded dataset. No I/O beyond strategy construction.
pub fn run_backtest_from_data(config: &BacktestConfig, data: &LoadedData) -> Result<BacktestResult, RunError> {
    let run_config = config.run_config()?;
    let mut strategy = create_strategy(&config.strategy, &run_config.fiat)?;

    let interval_ms = resolve_interval(&run_config, &data.timeline);
    let result = Engine::new(&run_config)
        .map_err(ConfigError::from)?
        .run(&data.timeline, strategy.as_mut());

    let params = ScoreParams {
        fiat: run_config.fiat.clone(),
        interval_ms,
        risk_free_rate: run_config.risk_free_rate,
    };
    let report = score_run(&result, &params)?;

    info!(
        strategy = %result.strategy,
        score = report.score,
        pnl_pct = report.pnl.percentage,
        sharpe = report.sharpe,
        max_drawdown = report.max_drawdown,
        trades = report.trade_count,
        rejected = report.rejected_order_count,
        "run scored"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id()?,
        dataset_hash: data.dataset_hash.clone(),
        strategy: result.strategy,
        config: config.clone(),
        interval_ms,
        snapshot_count: result.snapshot_count,
        report,
        equity_curve: result.equity_curve,
        trades: result.trades,
        rejections: result.rejections,
    })
}

/// Annualization interval: configured timeframe, else inferred from data, else one minute.
pub fn resolve_interval(config: &RunConfig, timeline: &Timeline) -> i64 {
    if let Some(ms) = config.interval_ms {
        return ms;
    }
    match timeline.inferred_interval_ms() {
        Some(ms) if ms > 0 => ms,
        _ => {
            warn!(
                default_ms = DEFAULT_INTERVAL_MS,
                "cannot infer candle interval; assuming one minute"
            );
            DEFAULT_INTERVAL_MS
        }
    }
}
