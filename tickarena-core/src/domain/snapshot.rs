//! Market snapshots: all pairs' candles at one exact timestamp.

use super::candle::Candle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every pair that published a candle at `timestamp`.
///
/// Pairs without data at this instant are absent; there is no forward-fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: i64,
    pub candles: BTreeMap<String, Candle>,
}

impl MarketSnapshot {
    pub fn get(&self, pair: &str) -> Option<&Candle> {
        self.candles.get(pair)
    }

    pub fn close(&self, pair: &str) -> Option<f64> {
        self.candles.get(pair).map(|c| c.close)
    }

    pub fn contains(&self, pair: &str) -> bool {
        self.candles.contains_key(pair)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &str> {
        self.candles.keys().map(|p| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Read-only view handed to a strategy on each tick: the snapshot plus the active fee rate.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub snapshot: &'a MarketSnapshot,
    pub fee_rate: f64,
}

impl<'a> MarketView<'a> {
    pub fn new(snapshot: &'a MarketSnapshot, fee_rate: f64) -> Self {
        Self { snapshot, fee_rate }
    }

    pub fn timestamp(&self) -> i64 {
        self.snapshot.timestamp
    }

    pub fn get(&self, pair: &str) -> Option<&'a Candle> {
        self.snapshot.candles.get(pair)
    }

    pub fn close(&self, pair: &str) -> Option<f64> {
        self.get(pair).map(|c| c.close)
    }
}
