//! Trade: one accepted fill, the system of record for turnover and fees.

use super::balances::Balances;
use super::order::OrderSide;
use serde::{Deserialize, Serialize};

/// An accepted order applied to the ledger.
///
/// `fee` and `notional` are denominated in the pair's quote asset. The `*_fiat`
/// fields are the same amounts converted at the snapshot's prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Position in the trade log (0-based).
    pub seq: usize,
    pub timestamp: i64,
    pub pair: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub price: f64,
    pub fee: f64,
    pub notional: f64,
    pub notional_fiat: f64,
    pub fee_fiat: f64,
    /// Balance sheet immediately after this fill.
    pub balances_after: Balances,
}

impl Trade {
    /// Quote-asset amount that changed hands, fee included.
    ///
    /// Buy: amount paid. Sell: amount received.
    pub fn quote_amount(&self) -> f64 {
        match self.side {
            OrderSide::Buy => self.notional + self.fee,
            OrderSide::Sell => self.notional - self.fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(side: OrderSide) -> Trade {
        Trade {
            seq: 0,
            timestamp: 60_000,
            pair: "token_1/fiat".into(),
            side,
            quantity: 2.0,
            price: 100.0,
            fee: 0.06,
            notional: 200.0,
            notional_fiat: 200.0,
            fee_fiat: 0.06,
            balances_after: Balances::new(),
        }
    }

    #[test]
    fn quote_amount_includes_fee_on_buy() {
        assert!((sample_trade(OrderSide::Buy).quote_amount() - 200.06).abs() < 1e-12);
    }

    #[test]
    fn quote_amount_excludes_fee_on_sell() {
        assert!((sample_trade(OrderSide::Sell).quote_amount() - 199.94).abs() < 1e-12);
    }
}
