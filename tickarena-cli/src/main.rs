//! TickArena CLI: run, score and synth commands.
//!
//! Commands:
//! - `run`: execute one or more backtests from TOML config files
//! - `score`: replay an order log against candle data and score it
//! - `synth`: write a deterministic synthetic triangle dataset
//!
//! Reports go to stdout as JSON; logs go to stderr (`RUST_LOG`, default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tickarena_core::data::{generate_triangle, SyntheticConfig};
use tickarena_core::strategy::StrategySpec;
use tickarena_runner::export::{export_candles_csv, export_report_json};
use tickarena_runner::{
    run_batch, run_single_backtest, save_artifacts, BacktestConfig, BacktestResult, BatchOptions,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tickarena",
    about = "TickArena: multi-pair candle backtesting and scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags that override values from a config file.
#[derive(clap::Args, Debug, Clone, Default)]
struct Overrides {
    /// Candle files (CSV or Parquet). Replaces the config's data list.
    #[arg(long, num_args = 1..)]
    data: Vec<PathBuf>,

    /// Fee in basis points.
    #[arg(long)]
    fee_bps: Option<f64>,

    /// Fiat valuation asset.
    #[arg(long)]
    fiat: Option<String>,

    /// Candle timeframe for annualization (e.g. 1m, 1h, 1d).
    #[arg(long)]
    timeframe: Option<String>,

    /// Initial balance as ASSET=QTY. Repeatable; replaces the config's balances.
    #[arg(long = "balance", value_parser = parse_balance)]
    balances: Vec<(String, f64)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute backtests from TOML config files. Several configs run as a parallel batch.
    Run {
        /// Path(s) to TOML config files.
        #[arg(long, required = true, num_args = 1..)]
        config: Vec<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,

        /// Run a batch on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Directory for report, manifest, trade, order and equity artifacts.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay an order log (`id,timestamp,pair,side,qty`) and score the result.
    Score {
        /// Order log CSV.
        #[arg(long)]
        orders: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Directory for report, manifest, trade, order and equity artifacts.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a synthetic token_1/fiat, token_2/fiat, token_1/token_2 dataset as CSV.
    Synth {
        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        /// Number of timestamps.
        #[arg(long, default_value_t = 1_440)]
        steps: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Probability that a pair skips a timestamp.
        #[arg(long, default_value_t = 0.0)]
        gap_probability: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            overrides,
            sequential,
            out,
        } => run_cmd(&config, &overrides, sequential, out.as_deref()),
        Commands::Score {
            orders,
            overrides,
            out,
        } => score_cmd(orders, &overrides, out.as_deref()),
        Commands::Synth {
            out,
            steps,
            seed,
            gap_probability,
        } => synth_cmd(&out, steps, seed, gap_probability),
    }
}

fn run_cmd(
    paths: &[PathBuf],
    overrides: &Overrides,
    sequential: bool,
    out: Option<&Path>,
) -> Result<()> {
    let configs = paths
        .iter()
        .map(|path| {
            let mut config = BacktestConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            apply_overrides(&mut config, overrides);
            Ok(config)
        })
        .collect::<Result<Vec<_>>>()?;

    if let [config] = configs.as_slice() {
        let result = run_single_backtest(config).context("backtest failed")?;
        return emit(&result, out);
    }

    let results = run_batch(
        &configs,
        BatchOptions {
            parallel: !sequential,
        },
    );

    let mut failures = 0;
    let mut summaries = Vec::with_capacity(results.len());
    for (path, result) in paths.iter().zip(&results) {
        match result {
            Ok(result) => {
                if let Some(dir) = out {
                    let run_dir = save_artifacts(result, dir)?;
                    info!(dir = %run_dir.display(), "artifacts saved");
                }
                summaries.push(json!({
                    "config": path.display().to_string(),
                    "run_id": result.run_id,
                    "strategy": result.strategy,
                    "report": result.report,
                }));
            }
            Err(e) => {
                failures += 1;
                summaries.push(json!({
                    "config": path.display().to_string(),
                    "error": e.to_string(),
                }));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    if failures > 0 {
        bail!("{failures} of {} runs failed", results.len());
    }
    Ok(())
}

fn score_cmd(orders: PathBuf, overrides: &Overrides, out: Option<&Path>) -> Result<()> {
    if overrides.data.is_empty() {
        bail!("--data is required for score");
    }
    let mut config = BacktestConfig {
        strategy: StrategySpec {
            orders: Some(orders),
            ..StrategySpec::new("replay")
        },
        ..Default::default()
    };
    apply_overrides(&mut config, overrides);

    let result = run_single_backtest(&config).context("scoring failed")?;
    emit(&result, out)
}

fn synth_cmd(out: &Path, steps: usize, seed: u64, gap_probability: f64) -> Result<()> {
    if !(0.0..1.0).contains(&gap_probability) {
        bail!("--gap-probability must be in [0, 1), got {gap_probability}");
    }
    let store = generate_triangle(&SyntheticConfig {
        seed,
        steps,
        gap_probability,
        ..Default::default()
    });
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, export_candles_csv(&store)?)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(
        path = %out.display(),
        candles = store.candle_count(),
        seed,
        "synthetic dataset written"
    );
    Ok(())
}

fn apply_overrides(config: &mut BacktestConfig, overrides: &Overrides) {
    if !overrides.data.is_empty() {
        config.backtest.data = overrides.data.clone();
    }
    if let Some(fee_bps) = overrides.fee_bps {
        config.backtest.fee_bps = fee_bps;
    }
    if let Some(fiat) = &overrides.fiat {
        config.backtest.fiat = fiat.clone();
    }
    if let Some(timeframe) = &overrides.timeframe {
        config.backtest.timeframe = Some(timeframe.clone());
    }
    if !overrides.balances.is_empty() {
        config.balances = overrides.balances.iter().cloned().collect::<BTreeMap<_, _>>();
    }
}

/// Print the report to stdout and optionally save the artifact set.
fn emit(result: &BacktestResult, out: Option<&Path>) -> Result<()> {
    println!("{}", export_report_json(&result.report)?);
    if let Some(dir) = out {
        let run_dir = save_artifacts(result, dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
    }
    Ok(())
}

fn parse_balance(raw: &str) -> Result<(String, f64), String> {
    let (asset, qty) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ASSET=QTY, got '{raw}'"))?;
    let asset = asset.trim();
    if asset.is_empty() {
        return Err(format!("empty asset in '{raw}'"));
    }
    let qty: f64 = qty
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity in '{raw}'"))?;
    Ok((asset.to_string(), qty))
}
