//! Triangle arbitrage across `A/Q`, `B/Q` and `A/B`.
//!
//! The implied cross is `price(A/Q) / price(B/Q)`. When the quoted `A/B`
//! close deviates from it by more than `threshold` (relative), the strategy
//! trades the quoted cross toward the implied price: buy `A/B` when it is
//! cheap, sell it when it is rich. Acts only on snapshots carrying all three
//! pairs.

use super::Strategy;
use crate::domain::{Balances, MarketView, OrderIntent, Pair};

pub const DEFAULT_THRESHOLD: f64 = 0.005;
pub const DEFAULT_QUANTITY: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct TriangleArbitrage {
    base_quote: String,
    cross_quote: String,
    cross: String,
    threshold: f64,
    quantity: f64,
}

impl TriangleArbitrage {
    /// Build from the cross pair `A/B` and the common quote `Q`.
    pub fn new(cross: &Pair, quote: &str, threshold: f64, quantity: f64) -> Self {
        Self {
            base_quote: Pair::new(&cross.base, quote).id(),
            cross_quote: Pair::new(&cross.quote, quote).id(),
            cross: cross.id(),
            threshold,
            quantity,
        }
    }

    /// Relative deviation of the quoted cross from the implied cross, if all three pairs are present.
    pub fn divergence(&self, market: &MarketView<'_>) -> Option<f64> {
        let a = market.close(&self.base_quote)?;
        let b = market.close(&self.cross_quote)?;
        let quoted = market.close(&self.cross)?;
        if a <= 0.0 || b <= 0.0 {
            return None;
        }
        let implied = a / b;
        Some((quoted - implied) / implied)
    }
}

impl Strategy for TriangleArbitrage {
    fn name(&self) -> &str {
        "triangle_arbitrage"
    }

    fn on_tick(&mut self, market: &MarketView<'_>, _balances: &Balances) -> Option<OrderIntent> {
        let divergence = self.divergence(market)?;
        if divergence < -self.threshold {
            Some(OrderIntent::buy(self.cross.clone(), self.quantity))
        } else if divergence > self.threshold {
            Some(OrderIntent::sell(self.cross.clone(), self.quantity))
        } else {
            None
        }
    }
}
