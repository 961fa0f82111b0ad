//! Strategy contract and built-in strategies.
//!
//! A strategy sees one snapshot at a time through a read-only [`MarketView`]
//! plus the current balances, and answers with at most one market order. It
//! keeps whatever history it needs in `&mut self`; it never sees engine state
//! or future snapshots.

pub mod factory;
pub mod hold;
pub mod mean_reversion;
pub mod replay;
pub mod triangle;

use crate::domain::{Balances, MarketView, OrderIntent};

pub use factory::{create_strategy, FactoryError, StrategySpec};
pub use hold::Hold;
pub use mean_reversion::MeanReversion;
pub use replay::{OrderRecord, Replay, ReplayError};
pub use triangle::TriangleArbitrage;

/// A pluggable trading strategy.
///
/// Single-pair strategies are the degenerate case: they read one pair from the
/// view and ignore the rest.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "mean_reversion").
    fn name(&self) -> &str;

    /// Called exactly once per snapshot, in timestamp order.
    ///
    /// Returns `None` for no action.
    fn on_tick(&mut self, market: &MarketView<'_>, balances: &Balances) -> Option<OrderIntent>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_tick(&mut self, market: &MarketView<'_>, balances: &Balances) -> Option<OrderIntent> {
        (**self).on_tick(market, balances)
    }
}
