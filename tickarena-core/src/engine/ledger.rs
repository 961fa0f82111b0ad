//! Portfolio ledger: the only place balances change.
//!
//! Fills are all-or-nothing market orders at the snapshot close. The fee is a
//! fraction of the notional, always paid in the pair's quote asset:
//!
//! - buy: quote −= qty × price × (1 + fee), base += qty
//! - sell: base −= qty, quote += qty × price × (1 − fee)

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Balances, OrderIntent, OrderSide, Pair, Trade};

/// Why an order was not filled. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderRejected {
    #[error("insufficient {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: f64,
        available: f64,
    },

    #[error("invalid quantity {quantity}")]
    InvalidQuantity { quantity: f64 },

    #[error("invalid price {price}")]
    InvalidPrice { price: f64 },

    #[error("invalid fee rate {fee_rate}")]
    InvalidFeeRate { fee_rate: f64 },

    #[error("malformed pair '{pair}'")]
    MalformedPair { pair: String },

    #[error("no price for '{pair}' in this snapshot")]
    NoPrice { pair: String },
}

/// A rejection as recorded in the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedOrder {
    pub timestamp: i64,
    pub order: OrderIntent,
    pub reason: OrderRejected,
}

/// Balances plus the append-only trade and rejection logs of one run.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: Balances,
    trades: Vec<Trade>,
    rejections: Vec<RejectedOrder>,
}

impl Ledger {
    pub fn new(initial: Balances) -> Self {
        Self {
            balances: initial,
            trades: Vec::new(),
            rejections: Vec::new(),
        }
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn rejections(&self) -> &[RejectedOrder] {
        &self.rejections
    }

    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }

    /// Consume the ledger into `(balances, trades, rejections)`.
    pub fn into_parts(self) -> (Balances, Vec<Trade>, Vec<RejectedOrder>) {
        (self.balances, self.trades, self.rejections)
    }

    /// Fill `order` at `price`, or record why it cannot be filled.
    ///
    /// On acceptance the returned trade carries quote-denominated `notional`
    /// and `fee`; its fiat fields equal the quote amounts until
    /// [`Ledger::convert_last_trade`] is called.
    pub fn apply(
        &mut self,
        order: &OrderIntent,
        timestamp: i64,
        price: f64,
        fee_rate: f64,
    ) -> Result<&Trade, OrderRejected> {
        match self.settle(order, price, fee_rate) {
            Ok((notional, fee)) => {
                let trade = Trade {
                    seq: self.trades.len(),
                    timestamp,
                    pair: order.pair.clone(),
                    side: order.side,
                    quantity: order.quantity,
                    price,
                    fee,
                    notional,
                    notional_fiat: notional,
                    fee_fiat: fee,
                    balances_after: self.balances.clone(),
                };
                self.trades.push(trade);
                Ok(&self.trades[self.trades.len() - 1])
            }
            Err(reason) => Err(self.reject(order, timestamp, reason)),
        }
    }

    /// Record a rejection decided outside the ledger (e.g. no price this tick).
    pub fn reject(&mut self, order: &OrderIntent, timestamp: i64, reason: OrderRejected) -> OrderRejected {
        debug!(
            timestamp,
            pair = %order.pair,
            side = %order.side,
            quantity = order.quantity,
            %reason,
            "order rejected"
        );
        self.rejections.push(RejectedOrder {
            timestamp,
            order: order.clone(),
            reason: reason.clone(),
        });
        reason
    }

    /// Restate the most recent trade's notional and fee in fiat at `quote_fiat_rate`.
    pub fn convert_last_trade(&mut self, quote_fiat_rate: f64) {
        if let Some(trade) = self.trades.last_mut() {
            trade.notional_fiat = trade.notional * quote_fiat_rate;
            trade.fee_fiat = trade.fee * quote_fiat_rate;
        }
    }

    /// Validate and move balances. Returns `(notional, fee)` in quote units.
    fn settle(&mut self, order: &OrderIntent, price: f64, fee_rate: f64) -> Result<(f64, f64), OrderRejected> {
        if !(order.quantity.is_finite() && order.quantity > 0.0) {
            return Err(OrderRejected::InvalidQuantity {
                quantity: order.quantity,
            });
        }
        if !(price.is_finite() && price > 0.0) {
            return Err(OrderRejected::InvalidPrice { price });
        }
        if !(fee_rate.is_finite() && (0.0..1.0).contains(&fee_rate)) {
            return Err(OrderRejected::InvalidFeeRate { fee_rate });
        }
        let pair = Pair::parse(&order.pair).ok_or_else(|| OrderRejected::MalformedPair {
            pair: order.pair.clone(),
        })?;

        let notional = order.quantity * price;
        let fee = notional * fee_rate;
        let base_held = self.balances.get(&pair.base);
        let quote_held = self.balances.get(&pair.quote);

        match order.side {
            OrderSide::Buy => {
                let cost = notional * (1.0 + fee_rate);
                if quote_held < cost {
                    return Err(OrderRejected::InsufficientBalance {
                        asset: pair.quote,
                        required: cost,
                        available: quote_held,
                    });
                }
                self.balances.set(&pair.quote, quote_held - cost);
                self.balances.set(&pair.base, base_held + order.quantity);
            }
            OrderSide::Sell => {
                if base_held < order.quantity {
                    return Err(OrderRejected::InsufficientBalance {
                        asset: pair.base,
                        required: order.quantity,
                        available: base_held,
                    });
                }
                let proceeds = notional * (1.0 - fee_rate);
                self.balances.set(&pair.base, base_held - order.quantity);
                self.balances.set(&pair.quote, quote_held + proceeds);
            }
        }
        Ok((notional, fee))
    }
}
