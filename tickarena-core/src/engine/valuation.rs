//! Fiat valuation of balances from last-known pair closes.
//!
//! An asset is converted to the fiat unit directly (`asset/fiat` or
//! `fiat/asset`) or through one cross pair whose other leg has a direct fiat
//! price (e.g. `token_2` via `token_1/token_2` and `token_1/fiat`).

use crate::domain::{Balances, MarketSnapshot, Pair, Prices};

/// Fiat value of one unit of `asset`, if a conversion path exists.
pub fn fiat_rate(prices: &Prices, fiat: &str, asset: &str) -> Option<f64> {
    if asset == fiat {
        return Some(1.0);
    }
    if let Some(rate) = direct_rate(prices, fiat, asset) {
        return Some(rate);
    }

    for (id, &price) in prices {
        let Some(pair) = Pair::parse(id) else {
            continue;
        };
        if !(price.is_finite() && price > 0.0) {
            continue;
        }
        if pair.base == asset {
            // 1 asset = price quote
            if let Some(quote_rate) = direct_rate(prices, fiat, &pair.quote) {
                return Some(price * quote_rate);
            }
        } else if pair.quote == asset {
            // 1 base = price asset
            if let Some(base_rate) = direct_rate(prices, fiat, &pair.base) {
                return Some(base_rate / price);
            }
        }
    }
    None
}

/// Total fiat value of `balances`. Assets without a conversion path contribute zero.
pub fn portfolio_value(balances: &Balances, prices: &Prices, fiat: &str) -> f64 {
    balances
        .iter()
        .filter(|(_, qty)| *qty != 0.0)
        .filter_map(|(asset, qty)| fiat_rate(prices, fiat, asset).map(|rate| qty * rate))
        .sum()
}

/// Held assets (non-zero balance) that cannot be converted to fiat.
pub fn unvalued_assets<'a>(balances: &'a Balances, prices: &Prices, fiat: &str) -> Vec<&'a str> {
    balances
        .iter()
        .filter(|(_, qty)| *qty != 0.0)
        .filter(|(asset, _)| fiat_rate(prices, fiat, asset).is_none())
        .map(|(asset, _)| asset)
        .collect()
}

fn direct_rate(prices: &Prices, fiat: &str, asset: &str) -> Option<f64> {
    if asset == fiat {
        return Some(1.0);
    }
    if let Some(&p) = prices.get(&format!("{asset}/{fiat}")) {
        if p.is_finite() && p > 0.0 {
            return Some(p);
        }
    }
    match prices.get(&format!("{fiat}/{asset}")) {
        Some(&p) if p.is_finite() && p > 0.0 => Some(1.0 / p),
        _ => None,
    }
}

/// Last-known close per pair, carried forward across partial snapshots.
#[derive(Debug, Clone)]
pub struct PriceBook {
    fiat: String,
    prices: Prices,
}

impl PriceBook {
    pub fn new(fiat: impl Into<String>) -> Self {
        Self {
            fiat: fiat.into(),
            prices: Prices::new(),
        }
    }

    /// Start from known closes, typically [`Timeline::first_closes`](crate::data::Timeline::first_closes).
    pub fn seeded(fiat: impl Into<String>, prices: Prices) -> Self {
        Self {
            fiat: fiat.into(),
            prices,
        }
    }

    /// Record the closes of every pair present in `snapshot`.
    pub fn update(&mut self, snapshot: &MarketSnapshot) {
        for (pair, candle) in &snapshot.candles {
            self.prices.insert(pair.clone(), candle.close);
        }
    }

    pub fn price(&self, pair: &str) -> Option<f64> {
        self.prices.get(pair).copied()
    }

    pub fn prices(&self) -> &Prices {
        &self.prices
    }

    pub fn fiat(&self) -> &str {
        &self.fiat
    }

    pub fn fiat_rate(&self, asset: &str) -> Option<f64> {
        fiat_rate(&self.prices, &self.fiat, asset)
    }

    pub fn portfolio_value(&self, balances: &Balances) -> f64 {
        portfolio_value(balances, &self.prices, &self.fiat)
    }
}
