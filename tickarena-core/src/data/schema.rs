use polars::prelude::*;

use super::error::DataError;

/// Expected columns for candle data.
pub struct CandleSchema;

impl CandleSchema {
    /// Columns every candle file must carry (besides the pair column).
    pub const REQUIRED: [&'static str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

    /// Accepted names for the pair column, in order of preference.
    pub const PAIR_COLUMNS: [&'static str; 2] = ["symbol", "pair"];

    /// Validate a DataFrame and return the name of its pair column.
    ///
    /// Extra columns (e.g. a row `id`) are ignored.
    pub fn validate(df: &DataFrame) -> Result<&'static str, DataError> {
        let schema = df.schema();
        for name in Self::REQUIRED {
            if !schema.contains(name) {
                return Err(DataError::MissingColumn(name.to_string()));
            }
        }
        Self::PAIR_COLUMNS
            .into_iter()
            .find(|name| schema.contains(name))
            .ok_or_else(|| DataError::MissingColumn("symbol".to_string()))
    }
}
