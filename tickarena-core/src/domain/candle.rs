//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single pair at a single timestamp (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub pair: String,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }

    /// Describe why the candle is not sane, or `None` if it is.
    pub fn insanity_reason(&self) -> Option<&'static str> {
        if self.is_void() {
            Some("non-finite OHLCV value")
        } else if self.open <= 0.0 || self.close <= 0.0 {
            Some("non-positive open or close")
        } else if self.high < self.low {
            Some("high below low")
        } else if self.high < self.open.max(self.close) {
            Some("high below open/close")
        } else if self.low > self.open.min(self.close) {
            Some("low above open/close")
        } else if self.volume < 0.0 {
            Some("negative volume")
        } else {
            None
        }
    }

    /// Timestamp as a UTC datetime, if representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
    }
}

/// Render an epoch-millisecond timestamp for logs and exports.
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candle() -> Candle {
        Candle {
            pair: "token_1/fiat".into(),
            timestamp: 1_704_067_200_000,
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 12.5,
        }
    }

    #[test]
    fn candle_is_sane() {
        let candle = sample_candle();
        assert!(candle.is_sane());
        assert_eq!(candle.insanity_reason(), None);
    }

    #[test]
    fn candle_detects_void() {
        let mut candle = sample_candle();
        candle.close = f64::NAN;
        assert!(candle.is_void());
        assert!(!candle.is_sane());
        assert_eq!(candle.insanity_reason(), Some("non-finite OHLCV value"));
    }

    #[test]
    fn candle_detects_insane_high_low() {
        let mut candle = sample_candle();
        candle.high = 97.0; // below low
        assert!(!candle.is_sane());
        assert_eq!(candle.insanity_reason(), Some("high below low"));
    }

    #[test]
    fn candle_rejects_negative_volume() {
        let mut candle = sample_candle();
        candle.volume = -1.0;
        assert!(!candle.is_sane());
    }

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(1_704_067_200_000), "2024-01-01 00:00:00");
        assert_eq!(
            sample_candle().datetime().unwrap().timestamp_millis(),
            1_704_067_200_000
        );
    }
}
