//! Hold: never trades. The HODL baseline.

use super::Strategy;
use crate::domain::{Balances, MarketView, OrderIntent};

#[derive(Debug, Clone, Copy, Default)]
pub struct Hold;

impl Strategy for Hold {
    fn name(&self) -> &str {
        "hold"
    }

    fn on_tick(&mut self, _market: &MarketView<'_>, _balances: &Balances) -> Option<OrderIntent> {
        None
    }
}
