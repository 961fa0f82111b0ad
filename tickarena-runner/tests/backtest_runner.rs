//! Integration tests for the runner: TOML config → data files → engine → report → artifacts.
//!
//! Uses the three-pair triangle fixture from `tickarena-core` and synthetic
//! datasets written to temporary directories.

use std::path::{Path, PathBuf};
use tickarena_core::data::{generate_triangle, SyntheticConfig};
use tickarena_runner::config::BacktestConfig;
use tickarena_runner::export::{export_candles_csv, load_manifest};
use tickarena_runner::report::{DRAWDOWN_WEIGHT, SHARPE_WEIGHT, TURNOVER_SCALE, TURNOVER_WEIGHT};
use tickarena_runner::{
    run_batch, run_single_backtest, save_artifacts, BatchOptions, RunError, SCHEMA_VERSION,
};

/// 2024-01-01 00:01:00 UTC
const SECOND_MINUTE_MS: i64 = 1_704_067_260_000;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tickarena-core/tests/fixtures/triangle.csv")
}

fn triangle_toml(data: &Path) -> String {
    format!(
        r#"
[backtest]
data = ['{}']
fiat = "fiat"
fee_bps = 2.0

[balances]
fiat = 10000.0
token_1 = 1.0
token_2 = 1.0

[strategy]
type = "triangle_arbitrage"
pair = "token_1/token_2"
"#,
        data.display()
    )
}

fn replay_toml(data: &Path, orders: &Path) -> String {
    format!(
        r#"
[backtest]
data = ['{}']

[balances]
fiat = 10000.0
token_1 = 1.0
token_2 = 1.0

[strategy]
type = "replay"
orders = '{}'
"#,
        data.display(),
        orders.display()
    )
}

#[test]
fn triangle_fixture_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("arb.toml");
    std::fs::write(&config_path, triangle_toml(&fixture())).unwrap();

    let config = BacktestConfig::from_file(&config_path).unwrap();
    let result = run_single_backtest(&config).unwrap();

    assert_eq!(result.schema_version, SCHEMA_VERSION);
    assert_eq!(result.strategy, "triangle_arbitrage");
    assert_eq!(result.snapshot_count, 4);
    assert_eq!(result.equity_curve.len(), 4);
    assert_eq!(result.interval_ms, 60_000);

    let report = &result.report;
    assert!(report.trade_count >= 1);
    assert_eq!(result.trades[0].timestamp, SECOND_MINUTE_MS);
    assert_eq!(result.trades[0].pair, "token_1/token_2");
    assert!(report.turnover > 0.0);
    assert!(report.total_fees_paid > 0.0);

    let expected = SHARPE_WEIGHT * report.sharpe
        - DRAWDOWN_WEIGHT * report.max_drawdown.abs()
        - TURNOVER_WEIGHT * (report.turnover / TURNOVER_SCALE);
    assert!((report.score - expected).abs() < 1e-12);
    assert_eq!(report.initial_prices["token_2/fiat"], 40_000.0);
    assert_eq!(report.final_prices["token_2/fiat"], 40_080.0);
}

#[test]
fn artifacts_round_trip_and_replay_reproduces_trades() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("arb.toml");
    std::fs::write(&config_path, triangle_toml(&fixture())).unwrap();
    let original = run_single_backtest(&BacktestConfig::from_file(&config_path).unwrap()).unwrap();

    let run_dir = save_artifacts(&original, &dir.path().join("out")).unwrap();
    for file in ["report.json", "manifest.json", "trades.csv", "orders.csv", "equity.csv"] {
        assert!(run_dir.join(file).exists(), "missing {file}");
    }

    let manifest = load_manifest(&run_dir).unwrap();
    assert_eq!(manifest.run_id, original.run_id);
    assert_eq!(manifest.dataset_hash, original.dataset_hash);
    assert_eq!(manifest.trade_count, original.trades.len());
    assert_eq!(manifest.config, original.config);

    let report_json = std::fs::read_to_string(run_dir.join("report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report_json).unwrap();
    assert_eq!(report["trade_count"], original.trades.len());

    // Replaying the exported order log gives the same fills and the same scores.
    let replay_path = dir.path().join("replay.toml");
    std::fs::write(&replay_path, replay_toml(&fixture(), &run_dir.join("orders.csv"))).unwrap();
    let replayed = run_single_backtest(&BacktestConfig::from_file(&replay_path).unwrap()).unwrap();

    assert_eq!(replayed.strategy, "replay");
    assert_eq!(replayed.dataset_hash, original.dataset_hash);
    assert_eq!(replayed.trades, original.trades);
    assert_eq!(replayed.equity_curve, original.equity_curve);
    assert_eq!(replayed.report.score, original.report.score);
    assert_eq!(replayed.report.final_balances, original.report.final_balances);
}

#[test]
fn synthetic_csv_loads_and_scores() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("synth.csv");
    let store = generate_triangle(&SyntheticConfig {
        steps: 120,
        gap_probability: 0.1,
        ..Default::default()
    });
    std::fs::write(&data, export_candles_csv(&store).unwrap()).unwrap();

    let mut config = BacktestConfig::default();
    config.backtest.data = vec![data];
    config.balances.insert("token_1".into(), 2.0);
    config.strategy = tickarena_core::strategy::StrategySpec::new("triangle_arbitrage")
        .with_pair("token_1/token_2")
        .with_param("threshold", 0.001);

    let result = run_single_backtest(&config).unwrap();
    assert!(result.snapshot_count > 0 && result.snapshot_count <= 120);
    assert_eq!(result.equity_curve.len(), result.snapshot_count);
    assert_eq!(result.dataset_hash, store.dataset_hash());
    assert!(result.report.final_balances.is_valid());
}

#[test]
fn identical_configs_share_run_id() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("arb.toml");
    std::fs::write(&config_path, triangle_toml(&fixture())).unwrap();
    let config = BacktestConfig::from_file(&config_path).unwrap();

    let a = run_single_backtest(&config).unwrap();
    let b = run_single_backtest(&config).unwrap();
    assert_eq!(a.run_id, b.run_id);
    assert_eq!(a.report, b.report);
}

#[test]
fn batch_shares_dataset_and_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("arb.toml");
    std::fs::write(&config_path, triangle_toml(&fixture())).unwrap();
    let arb = BacktestConfig::from_file(&config_path).unwrap();

    let mut hold = arb.clone();
    hold.strategy = tickarena_core::strategy::StrategySpec::new("hold");

    let mut broken = arb.clone();
    broken.backtest.data = vec![dir.path().join("missing.csv")];

    let results = run_batch(&[arb, hold, broken], BatchOptions::default());
    assert_eq!(results.len(), 3);

    let arb = results[0].as_ref().unwrap();
    let hold = results[1].as_ref().unwrap();
    assert_eq!(arb.dataset_hash, hold.dataset_hash);
    assert_eq!(hold.report.trade_count, 0);
    assert_eq!(hold.report.hodl_pnl.strategy_excess, 0.0);
    assert!(matches!(results[2], Err(RunError::DatasetUnavailable { .. })));
}

#[test]
fn late_listed_holding_scores_flat() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("late.csv");
    std::fs::write(
        &data,
        "id,timestamp,symbol,open,high,low,close,volume\n\
         0,2024-01-01 00:00:00,token_1/fiat,100.0,100.0,100.0,100.0,1.0\n\
         1,2024-01-01 00:01:00,token_1/fiat,100.0,100.0,100.0,100.0,1.0\n\
         2,2024-01-01 00:01:00,token_2/fiat,50.0,50.0,50.0,50.0,1.0\n\
         3,2024-01-01 00:02:00,token_1/fiat,100.0,100.0,100.0,100.0,1.0\n\
         4,2024-01-01 00:02:00,token_2/fiat,50.0,50.0,50.0,50.0,1.0\n",
    )
    .unwrap();

    let mut config = BacktestConfig::default();
    config.backtest.data = vec![data];
    config.balances = [("fiat".to_string(), 1000.0), ("token_2".to_string(), 10.0)]
        .into_iter()
        .collect();
    config.strategy = tickarena_core::strategy::StrategySpec::new("hold");

    let result = run_single_backtest(&config).unwrap();
    let equity: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
    assert_eq!(equity, vec![1500.0, 1500.0, 1500.0]);

    let report = &result.report;
    assert_eq!(report.pnl.absolute, 0.0);
    assert_eq!(report.sharpe, 0.0);
    assert_eq!(report.max_drawdown, 0.0);
    assert_eq!(report.score, 0.0);
    assert_eq!(report.hodl_pnl.initial_value, 1500.0);
    assert_eq!(report.hodl_pnl.strategy_excess, 0.0);
}
