//! Balances: the balance sheet of a single run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from asset symbol to a non-negative quantity.
///
/// Only the ledger mutates balances; strategies receive `&Balances`.
/// Assets that were never credited read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<String, f64>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held of `asset` (zero if unknown).
    pub fn get(&self, asset: &str) -> f64 {
        self.0.get(asset).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(asset, qty)| (asset.as_str(), *qty))
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|a| a.as_str())
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every quantity is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.0.values().all(|q| q.is_finite() && *q >= 0.0)
    }

    pub(crate) fn set(&mut self, asset: &str, quantity: f64) {
        self.0.insert(asset.to_string(), quantity);
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Balances {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(a, q)| (a.into(), q)).collect())
    }
}

impl From<BTreeMap<String, f64>> for Balances {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}
