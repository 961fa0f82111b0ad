//! Candle store: per-pair candle sequences, validated before use.

use super::error::DataError;
use crate::domain::{Candle, Pair};
use std::collections::BTreeMap;

/// Per-pair candle sequences keyed by pair identifier.
///
/// Construction only groups candles; [`CandleStore::validate`] (called by the
/// synchronizer) enforces strict timestamp ordering and candle sanity.
#[derive(Debug, Clone, Default)]
pub struct CandleStore {
    series: BTreeMap<String, Vec<Candle>>,
}

impl CandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group a flat candle list by pair, preserving input order within each pair.
    pub fn from_candles(candles: impl IntoIterator<Item = Candle>) -> Self {
        let mut store = Self::new();
        for candle in candles {
            store.push(candle);
        }
        store
    }

    /// Append one candle to its pair's sequence.
    pub fn push(&mut self, candle: Candle) {
        self.series.entry(candle.pair.clone()).or_default().push(candle);
    }

    /// Replace the sequence for `pair`.
    pub fn insert_series(&mut self, pair: impl Into<String>, candles: Vec<Candle>) {
        self.series.insert(pair.into(), candles);
    }

    /// Merge another store into this one, appending per pair.
    pub fn extend(&mut self, other: CandleStore) {
        for (pair, candles) in other.series {
            self.series.entry(pair).or_default().extend(candles);
        }
    }

    pub fn series(&self, pair: &str) -> Option<&[Candle]> {
        self.series.get(pair).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Candle])> {
        self.series.iter().map(|(p, c)| (p.as_str(), c.as_slice()))
    }

    pub fn pairs(&self) -> Vec<&str> {
        self.series.keys().map(|p| p.as_str()).collect()
    }

    pub fn candle_count(&self) -> usize {
        self.series.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.candle_count() == 0
    }

    /// Validate every pair's sequence.
    ///
    /// Fails on the first malformed pair id, pair mismatch, insane candle,
    /// duplicate timestamp or out-of-order timestamp.
    pub fn validate(&self) -> Result<(), DataError> {
        for (pair, candles) in &self.series {
            validate_series(pair, candles)?;
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash over all candle data, in pair order.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (pair, candles) in &self.series {
            hasher.update(pair.as_bytes());
            for c in candles {
                hasher.update(&c.timestamp.to_le_bytes());
                hasher.update(&c.open.to_le_bytes());
                hasher.update(&c.high.to_le_bytes());
                hasher.update(&c.low.to_le_bytes());
                hasher.update(&c.close.to_le_bytes());
                hasher.update(&c.volume.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Validate one pair's sequence: strictly increasing, unique, sane candles.
pub fn validate_series(pair: &str, candles: &[Candle]) -> Result<(), DataError> {
    if Pair::parse(pair).is_none() {
        return Err(DataError::MalformedPair {
            pair: pair.to_string(),
        });
    }

    let mut previous: Option<i64> = None;
    for candle in candles {
        if candle.pair != pair {
            return Err(DataError::InvalidCandle {
                pair: pair.to_string(),
                timestamp: candle.timestamp,
                reason: format!("candle belongs to pair '{}'", candle.pair),
            });
        }
        if let Some(reason) = candle.insanity_reason() {
            return Err(DataError::InvalidCandle {
                pair: pair.to_string(),
                timestamp: candle.timestamp,
                reason: reason.to_string(),
            });
        }
        if let Some(prev) = previous {
            if candle.timestamp == prev {
                return Err(DataError::DuplicateTimestamp {
                    pair: pair.to_string(),
                    timestamp: candle.timestamp,
                });
            }
            if candle.timestamp < prev {
                return Err(DataError::UnsortedTimestamps {
                    pair: pair.to_string(),
                    previous: prev,
                    timestamp: candle.timestamp,
                });
            }
        }
        previous = Some(candle.timestamp);
    }
    Ok(())
}
