//! Candle ingestion from merged CSV and Parquet files.
//!
//! A file holds rows `timestamp, symbol, open, high, low, close, volume` for
//! any number of pairs. Rows are grouped by pair in file order; ordering and
//! sanity are checked later by the synchronizer.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::DataError;
use super::schema::CandleSchema;
use super::store::CandleStore;
use crate::domain::Candle;

/// Load and merge several candle files into one store.
pub fn load_files(paths: &[PathBuf]) -> Result<CandleStore, DataError> {
    let mut store = CandleStore::new();
    for path in paths {
        store.extend(load_file(path)?);
    }
    Ok(store)
}

/// Load one CSV or Parquet file, chosen by extension.
pub fn load_file(path: &Path) -> Result<CandleStore, DataError> {
    let df = read_frame(path)?;
    let candles = candles_from_frame(&df)?;
    info!(
        path = %path.display(),
        rows = candles.len(),
        "loaded candle file"
    );
    Ok(CandleStore::from_candles(candles))
}

/// Read a file into a DataFrame without interpreting it.
pub fn read_frame(path: &Path) -> Result<DataFrame, DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") => CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| ingest_failed(path, e)),
        Some("parquet") | Some("pq") => {
            let file = std::fs::File::open(path)
                .map_err(|e| DataError::IngestFailed(format!("{}: {e}", path.display())))?;
            ParquetReader::new(file)
                .finish()
                .map_err(|e| ingest_failed(path, e))
        }
        _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Convert a validated DataFrame into candles, one per row.
pub fn candles_from_frame(df: &DataFrame) -> Result<Vec<Candle>, DataError> {
    let pair_column = CandleSchema::validate(df)?;

    let timestamps = timestamp_values(df)?;
    let pairs = string_values(df, pair_column)?;
    let open = float_values(df, "open")?;
    let high = float_values(df, "high")?;
    let low = float_values(df, "low")?;
    let close = float_values(df, "close")?;
    let volume = float_values(df, "volume")?;

    let mut candles = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        candles.push(Candle {
            pair: required(pairs[row].clone(), row, pair_column)?,
            timestamp: required(timestamps[row], row, "timestamp")?,
            open: required(open[row], row, "open")?,
            high: required(high[row], row, "high")?,
            low: required(low[row], row, "low")?,
            close: required(close[row], row, "close")?,
            volume: required(volume[row], row, "volume")?,
        });
    }
    debug!(rows = candles.len(), pair_column, "converted frame to candles");
    Ok(candles)
}

/// Parse a timestamp string: epoch milliseconds, `%Y-%m-%d %H:%M:%S[.f]`, or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ndt| ndt.and_utc().timestamp_millis())
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, DataError> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| DataError::MissingColumn(name.to_string()))
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DataError> {
    let series = column(df, name)?
        .cast(&DataType::Float64)
        .map_err(|e| invalid_column(name, e))?;
    let values = series.f64().map_err(|e| invalid_column(name, e))?;
    Ok(values.into_iter().collect())
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, DataError> {
    let series = column(df, name)?
        .cast(&DataType::String)
        .map_err(|e| invalid_column(name, e))?;
    let values = series.str().map_err(|e| invalid_column(name, e))?;
    Ok(values
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect())
}

fn timestamp_values(df: &DataFrame) -> Result<Vec<Option<i64>>, DataError> {
    let series = column(df, "timestamp")?;
    match series.dtype() {
        DataType::String => {
            let values = series.str().map_err(|e| invalid_column("timestamp", e))?;
            values
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.map(|raw| {
                        parse_timestamp(raw).ok_or_else(|| DataError::InvalidValue {
                            row,
                            column: "timestamp".into(),
                            reason: format!("unparseable timestamp '{raw}'"),
                        })
                    })
                    .transpose()
                })
                .collect()
        }
        DataType::Datetime(_, tz) => {
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, tz.clone()))
                .and_then(|s| s.cast(&DataType::Int64))
                .map_err(|e| invalid_column("timestamp", e))?;
            let values = millis.i64().map_err(|e| invalid_column("timestamp", e))?;
            Ok(values.into_iter().collect())
        }
        dtype if dtype.is_integer() || dtype.is_float() => {
            let millis = series
                .cast(&DataType::Int64)
                .map_err(|e| invalid_column("timestamp", e))?;
            let values = millis.i64().map_err(|e| invalid_column("timestamp", e))?;
            Ok(values.into_iter().collect())
        }
        other => Err(DataError::InvalidValue {
            row: 0,
            column: "timestamp".into(),
            reason: format!("unsupported column type {other:?}"),
        }),
    }
}

fn required<T>(value: Option<T>, row: usize, column: &str) -> Result<T, DataError> {
    value.ok_or_else(|| DataError::InvalidValue {
        row,
        column: column.to_string(),
        reason: "missing value".into(),
    })
}

fn invalid_column(name: &str, e: PolarsError) -> DataError {
    DataError::InvalidValue {
        row: 0,
        column: name.to_string(),
        reason: e.to_string(),
    }
}

fn ingest_failed(path: &Path, e: PolarsError) -> DataError {
    DataError::IngestFailed(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_timestamp_formats() {
        assert_eq!(parse_timestamp("1704067200000"), Some(1_704_067_200_000));
        assert_eq!(
            parse_timestamp("2024-01-01 00:01:00"),
            Some(1_704_067_260_000)
        );
        assert_eq!(
            parse_timestamp("2024-01-01T00:00:00Z"),
            Some(1_704_067_200_000)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn converts_frame_with_string_timestamps() {
        let df = DataFrame::new(vec![
            Series::new("id".into(), &["a", "b"]).into(),
            Series::new(
                "timestamp".into(),
                &["2024-01-01 00:00:00", "2024-01-01 00:01:00"],
            )
            .into(),
            Series::new("symbol".into(), &["token_1/fiat", "token_1/fiat"]).into(),
            Series::new("open".into(), &[100.0, 101.0]).into(),
            Series::new("high".into(), &[102.0, 103.0]).into(),
            Series::new("low".into(), &[99.0, 100.0]).into(),
            Series::new("close".into(), &[101.0, 102.0]).into(),
            Series::new("volume".into(), &[5i64, 7]).into(),
        ])
        .unwrap();

        let candles = candles_from_frame(&df).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].pair, "token_1/fiat");
        assert_eq!(candles[1].timestamp - candles[0].timestamp, 60_000);
        assert_eq!(candles[1].volume, 7.0);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = read_frame(Path::new("candles.json")).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat(_)));
    }

    #[test]
    fn loads_merged_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "timestamp,symbol,open,high,low,close,volume").unwrap();
        writeln!(file, "0,token_1/fiat,100,101,99,100.5,3").unwrap();
        writeln!(file, "0,token_2/fiat,50,51,49,50.5,4").unwrap();
        writeln!(file, "60000,token_1/fiat,100.5,102,100,101.5,2").unwrap();
        drop(file);

        let store = load_file(&path).unwrap();
        assert_eq!(store.pairs(), vec!["token_1/fiat", "token_2/fiat"]);
        assert_eq!(store.series("token_1/fiat").unwrap()[1].close, 101.5);
        assert!(store.validate().is_ok());
    }
}
