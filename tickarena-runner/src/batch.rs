//! Batch runs: many independent backtests in parallel.
//!
//! Each distinct set of data files is loaded and synchronized once; runs that
//! share it borrow the same immutable timeline. Every run owns its ledger,
//! trade log and equity curve.

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use crate::config::BacktestConfig;
use crate::runner::{load_data, run_backtest_from_data, BacktestResult, LoadedData, RunError};

/// Options for [`run_batch`].
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Use the rayon thread pool (default true).
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Run every config; results come back in input order.
pub fn run_batch(configs: &[BacktestConfig], options: BatchOptions) -> Vec<Result<BacktestResult, RunError>> {
    // Load each distinct dataset once.
    let mut keys: Vec<Vec<PathBuf>> = configs.iter().map(|c| c.backtest.data.clone()).collect();
    keys.sort();
    keys.dedup();

    let load = |files: &Vec<PathBuf>| (files.clone(), load_data(files).map_err(|e| e.to_string()));
    let datasets: BTreeMap<Vec<PathBuf>, Result<LoadedData, String>> = if options.parallel {
        keys.par_iter().map(load).collect()
    } else {
        keys.iter().map(load).collect()
    };

    info!(
        runs = configs.len(),
        datasets = datasets.len(),
        parallel = options.parallel,
        "starting batch"
    );

    let run_one = |config: &BacktestConfig| -> Result<BacktestResult, RunError> {
        config.validate()?;
        match datasets.get(&config.backtest.data) {
            Some(Ok(data)) => run_backtest_from_data(config, data),
            Some(Err(reason)) => Err(RunError::DatasetUnavailable {
                paths: describe(&config.backtest.data),
                reason: reason.clone(),
            }),
            None => Err(RunError::DatasetUnavailable {
                paths: describe(&config.backtest.data),
                reason: "not loaded".into(),
            }),
        }
    };

    if options.parallel {
        configs.par_iter().map(run_one).collect()
    } else {
        configs.iter().map(run_one).collect()
    }
}

/// Run configs against one pre-loaded dataset, ignoring their `data` entries.
pub fn run_batch_on(
    configs: &[BacktestConfig],
    data: &LoadedData,
    options: BatchOptions,
) -> Vec<Result<BacktestResult, RunError>> {
    if options.parallel {
        configs
            .par_iter()
            .map(|config| run_backtest_from_data(config, data))
            .collect()
    } else {
        configs
            .iter()
            .map(|config| run_backtest_from_data(config, data))
            .collect()
    }
}

fn describe(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
