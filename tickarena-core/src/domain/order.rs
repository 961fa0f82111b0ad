//! Order intents produced by strategies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    /// Parse `buy`/`sell` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(OrderSide::Buy),
            "sell" => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A market order the strategy wants executed at this tick's close.
///
/// Stateless: consumed immediately by the ledger or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub pair: String,
    pub side: OrderSide,
    pub quantity: f64,
}

impl OrderIntent {
    pub fn buy(pair: impl Into<String>, quantity: f64) -> Self {
        Self {
            pair: pair.into(),
            side: OrderSide::Buy,
            quantity,
        }
    }

    pub fn sell(pair: impl Into<String>, quantity: f64) -> Self {
        Self {
            pair: pair.into(),
            side: OrderSide::Sell,
            quantity,
        }
    }
}
