//! Structured error types for data operations.
//!
//! Every variant is fatal: a run with bad candle data aborts before the
//! simulation starts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("duplicate timestamp {timestamp} for pair '{pair}'")]
    DuplicateTimestamp { pair: String, timestamp: i64 },

    #[error("unsorted candles for pair '{pair}': timestamp {timestamp} follows {previous}")]
    UnsortedTimestamps {
        pair: String,
        previous: i64,
        timestamp: i64,
    },

    #[error("invalid candle for pair '{pair}' at {timestamp}: {reason}")]
    InvalidCandle {
        pair: String,
        timestamp: i64,
        reason: String,
    },

    #[error("malformed pair identifier '{pair}' (expected base/quote)")]
    MalformedPair { pair: String },

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("row {row}: invalid {column}: {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("unsupported data file '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("ingest failed: {0}")]
    IngestFailed(String),
}
