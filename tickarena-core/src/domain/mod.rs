//! Domain types for TickArena

pub mod balances;
pub mod candle;
pub mod order;
pub mod pair;
pub mod snapshot;
pub mod trade;

pub use balances::Balances;
pub use candle::{format_timestamp, Candle};
pub use order::{OrderIntent, OrderSide};
pub use pair::Pair;
pub use snapshot::{MarketSnapshot, MarketView};
pub use trade::Trade;

/// Last-known close per pair identifier.
pub type Prices = std::collections::BTreeMap<String, f64>;
