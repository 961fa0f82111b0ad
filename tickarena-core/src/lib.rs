//! TickArena Core: candle data, market timeline, portfolio ledger, simulation loop, strategies.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (candles, pairs, snapshots, balances, orders, trades)
//! - Candle ingestion (CSV/Parquet), validation and synthetic generation
//! - Timeline synchronization of many pairs into per-timestamp snapshots
//! - Portfolio ledger with fee and balance-sufficiency rules
//! - Snapshot-by-snapshot event loop with fiat mark-to-market
//! - Strategy trait and built-in strategies

pub mod data;
pub mod domain;
pub mod engine;
pub mod strategy;
