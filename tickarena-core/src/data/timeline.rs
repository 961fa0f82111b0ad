//! Multi-pair time synchronization.
//!
//! Given candles for multiple pairs, merge them into one ordered sequence of
//! snapshots, one per distinct timestamp. A snapshot holds exactly the pairs
//! that published a candle at that instant: no forward-fill, no interpolation.

use super::error::DataError;
use super::store::CandleStore;
use crate::domain::{Candle, MarketSnapshot, Prices};
use std::collections::{BTreeMap, HashMap};

/// Ordered market snapshots for a whole dataset.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// Snapshots sorted by ascending timestamp.
    pub snapshots: Vec<MarketSnapshot>,
    /// Pairs present anywhere in the dataset, sorted.
    pub pairs: Vec<String>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MarketSnapshot> {
        self.snapshots.iter()
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.snapshots.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.snapshots.last().map(|s| s.timestamp)
    }

    /// First close of every pair, taken from the snapshot where it first appears.
    pub fn first_closes(&self) -> Prices {
        let mut closes = Prices::new();
        for snapshot in &self.snapshots {
            for (pair, candle) in &snapshot.candles {
                closes.entry(pair.clone()).or_insert(candle.close);
            }
            if closes.len() == self.pairs.len() {
                break;
            }
        }
        closes
    }

    /// Most common gap between consecutive snapshots, in milliseconds.
    ///
    /// Ties resolve to the smaller gap. `None` with fewer than two snapshots.
    pub fn inferred_interval_ms(&self) -> Option<i64> {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.snapshots.windows(2) {
            *counts.entry(w[1].timestamp - w[0].timestamp).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by(|(gap_a, n_a), (gap_b, n_b)| n_a.cmp(n_b).then(gap_b.cmp(gap_a)))
            .map(|(gap, _)| gap)
    }
}

/// Merge per-pair candle sequences into a timeline.
///
/// Every sequence is validated first; an unsorted sequence, a duplicate
/// timestamp or an insane candle fails with [`DataError`] before any snapshot
/// is built.
pub fn synchronize(store: &CandleStore) -> Result<Timeline, DataError> {
    store.validate()?;

    let mut by_timestamp: BTreeMap<i64, BTreeMap<String, Candle>> = BTreeMap::new();
    for (pair, candles) in store.iter() {
        for candle in candles {
            by_timestamp
                .entry(candle.timestamp)
                .or_default()
                .insert(pair.to_string(), candle.clone());
        }
    }

    let snapshots = by_timestamp
        .into_iter()
        .map(|(timestamp, candles)| MarketSnapshot { timestamp, candles })
        .collect();

    Ok(Timeline {
        snapshots,
        pairs: store.pairs().into_iter().map(String::from).collect(),
    })
}
