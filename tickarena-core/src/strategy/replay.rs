//! Replay of a recorded order log.
//!
//! The log is a CSV with header `id,timestamp,pair,side,qty`, the format the
//! runner writes as `orders.csv`. Each row is submitted at the snapshot whose
//! timestamp matches exactly; rows for timestamps the timeline never reaches
//! are silently skipped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use super::Strategy;
use crate::data::ingest::parse_timestamp;
use crate::domain::{Balances, MarketView, OrderIntent, OrderSide};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to open order log {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("order log: {0}")]
    Csv(#[from] csv::Error),

    #[error("order log line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("order log line {line}: second order at timestamp {timestamp}")]
    DuplicateTimestamp { line: usize, timestamp: i64 },
}

/// One row of an order log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub timestamp: i64,
    pub pair: String,
    pub side: OrderSide,
    pub qty: f64,
}

impl OrderRecord {
    pub fn new(id: impl Into<String>, timestamp: i64, order: &OrderIntent) -> Self {
        Self {
            id: id.into(),
            timestamp,
            pair: order.pair.clone(),
            side: order.side,
            qty: order.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    pair: String,
    side: String,
    qty: f64,
}

/// Submits pre-recorded orders by exact timestamp match.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    orders: BTreeMap<i64, OrderIntent>,
}

impl Replay {
    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let file = std::fs::File::open(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReplayError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut orders = BTreeMap::new();
        for (i, row) in rdr.deserialize::<RawRecord>().enumerate() {
            let line = i + 2;
            let raw = row?;
            let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| ReplayError::InvalidRow {
                line,
                reason: format!("unparseable timestamp '{}'", raw.timestamp),
            })?;
            let side = OrderSide::parse(&raw.side).ok_or_else(|| ReplayError::InvalidRow {
                line,
                reason: format!("unknown side '{}'", raw.side),
            })?;
            let order = OrderIntent {
                pair: raw.pair,
                side,
                quantity: raw.qty,
            };
            if orders.insert(timestamp, order).is_some() {
                return Err(ReplayError::DuplicateTimestamp { line, timestamp });
            }
        }
        Ok(Self { orders })
    }

    pub fn from_records(records: &[OrderRecord]) -> Result<Self, ReplayError> {
        let mut orders = BTreeMap::new();
        for (i, r) in records.iter().enumerate() {
            let order = OrderIntent {
                pair: r.pair.clone(),
                side: r.side,
                quantity: r.qty,
            };
            if orders.insert(r.timestamp, order).is_some() {
                return Err(ReplayError::DuplicateTimestamp {
                    line: i + 2,
                    timestamp: r.timestamp,
                });
            }
        }
        Ok(Self { orders })
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Strategy for Replay {
    fn name(&self) -> &str {
        "replay"
    }

    fn on_tick(&mut self, market: &MarketView<'_>, _balances: &Balances) -> Option<OrderIntent> {
        self.orders.get(&market.timestamp()).cloned()
    }
}
