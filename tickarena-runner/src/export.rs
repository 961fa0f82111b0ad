//! Artifact export: JSON report and manifest, CSV trade tape, order log and equity curve.
//!
//! All persisted JSON artifacts carry a `schema_version` field. Unknown
//! versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickarena_core::data::CandleStore;
use tickarena_core::domain::{format_timestamp, Trade};
use tickarena_core::engine::EquityPoint;
use tickarena_core::strategy::OrderRecord;

use crate::config::BacktestConfig;
use crate::report::ScoringReport;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Identity of a run: what was run, on which data, with which settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: String,
    pub dataset_hash: String,
    pub strategy: String,
    pub created_at: DateTime<Utc>,
    pub interval_ms: i64,
    pub snapshot_count: usize,
    pub trade_count: usize,
    pub rejected_order_count: usize,
    pub config: BacktestConfig,
}

impl RunManifest {
    pub fn from_result(result: &BacktestResult) -> Self {
        Self {
            schema_version: result.schema_version,
            run_id: result.run_id.clone(),
            dataset_hash: result.dataset_hash.clone(),
            strategy: result.strategy.clone(),
            created_at: Utc::now(),
            interval_ms: result.interval_ms,
            snapshot_count: result.snapshot_count,
            trade_count: result.report.trade_count,
            rejected_order_count: result.report.rejected_order_count,
            config: result.config.clone(),
        }
    }
}

/// Serialize a scoring report to pretty JSON.
pub fn export_report_json(report: &ScoringReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScoringReport to JSON")
}

/// Serialize a run manifest to pretty JSON.
pub fn export_manifest_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize RunManifest to JSON")
}

/// Deserialize a run manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize RunManifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade tape.
///
/// Columns: seq, timestamp, datetime, pair, side, quantity, price, fee,
/// notional, notional_fiat, fee_fiat
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "seq",
        "timestamp",
        "datetime",
        "pair",
        "side",
        "quantity",
        "price",
        "fee",
        "notional",
        "notional_fiat",
        "fee_fiat",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.seq.to_string(),
            &t.timestamp.to_string(),
            &format_timestamp(t.timestamp),
            &t.pair,
            t.side.as_str(),
            &t.quantity.to_string(),
            &t.price.to_string(),
            &t.fee.to_string(),
            &t.notional.to_string(),
            &format!("{:.6}", t.notional_fiat),
            &format!("{:.6}", t.fee_fiat),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export accepted orders as a replayable order log (`id,timestamp,pair,side,qty`).
pub fn export_orders_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for t in trades {
        wtr.serialize(OrderRecord {
            id: t.seq.to_string(),
            timestamp: t.timestamp,
            pair: t.pair.clone(),
            side: t.side,
            qty: t.quantity,
        })?;
    }
    if trades.is_empty() {
        wtr.write_record(["id", "timestamp", "pair", "side", "qty"])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the equity curve. Columns: timestamp, datetime, equity
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "datetime", "equity"])?;
    for p in equity_curve {
        wtr.write_record([
            &p.timestamp.to_string(),
            &format_timestamp(p.timestamp),
            &format!("{:.6}", p.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export candles in the merged ingestion format (`id,timestamp,symbol,open,high,low,close,volume`).
pub fn export_candles_csv(store: &CandleStore) -> Result<String> {
    let mut candles: Vec<_> = store.iter().flat_map(|(_, series)| series.iter()).collect();
    candles.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.pair.cmp(&b.pair)));

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["id", "timestamp", "symbol", "open", "high", "low", "close", "volume"])?;
    for (id, c) in candles.iter().enumerate() {
        wtr.write_record([
            &id.to_string(),
            &c.timestamp.to_string(),
            &c.pair,
            &c.open.to_string(),
            &c.high.to_string(),
            &c.low.to_string(),
            &c.close.to_string(),
            &c.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{strategy}_{run_id prefix}/` under `output_dir`
/// containing:
/// - `report.json`: the scoring report
/// - `manifest.json`: run identity, dataset hash and config
/// - `trades.csv`: trade tape
/// - `orders.csv`: replayable order log
/// - `equity.csv`: per-snapshot equity curve
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", result.strategy, short_id));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("report.json"), &export_report_json(&result.report)?)?;
    write(
        &run_dir.join("manifest.json"),
        &export_manifest_json(&RunManifest::from_result(result))?,
    )?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write(&run_dir.join("orders.csv"), &export_orders_csv(&result.trades)?)?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(&result.equity_curve)?)?;

    Ok(run_dir)
}

/// Load the manifest from an artifact directory. Rejects unknown schema versions.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_manifest_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
