//! Mean reversion on a single pair.
//!
//! Keeps the last `window` closes of its pair. Once the window is full, buys
//! when the close drops below `mean − threshold·σ` and sells when it rises
//! above `mean + threshold·σ` (population σ over the window, current close
//! included). Snapshots without the pair are ignored.

use std::collections::VecDeque;

use super::Strategy;
use crate::domain::{Balances, MarketView, OrderIntent};

pub const DEFAULT_WINDOW: usize = 30;
pub const DEFAULT_THRESHOLD: f64 = 2.0;
pub const DEFAULT_QUANTITY: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct MeanReversion {
    pair: String,
    window: usize,
    threshold: f64,
    quantity: f64,
    closes: VecDeque<f64>,
}

impl MeanReversion {
    pub fn new(pair: impl Into<String>, window: usize, threshold: f64, quantity: f64) -> Self {
        let window = window.max(2);
        Self {
            pair: pair.into(),
            window,
            threshold,
            quantity,
            closes: VecDeque::with_capacity(window),
        }
    }

    pub fn with_defaults(pair: impl Into<String>) -> Self {
        Self::new(pair, DEFAULT_WINDOW, DEFAULT_THRESHOLD, DEFAULT_QUANTITY)
    }

    fn band(&self) -> (f64, f64) {
        let n = self.closes.len() as f64;
        let mean = self.closes.iter().sum::<f64>() / n;
        let var = self.closes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn on_tick(&mut self, market: &MarketView<'_>, _balances: &Balances) -> Option<OrderIntent> {
        let close = market.close(&self.pair)?;
        if self.closes.len() == self.window {
            self.closes.pop_front();
        }
        self.closes.push_back(close);
        if self.closes.len() < self.window {
            return None;
        }

        let (mean, sigma) = self.band();
        if close < mean - self.threshold * sigma {
            Some(OrderIntent::buy(self.pair.clone(), self.quantity))
        } else if close > mean + self.threshold * sigma {
            Some(OrderIntent::sell(self.pair.clone(), self.quantity))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, MarketSnapshot, OrderSide};
    use std::collections::BTreeMap;

    fn snapshot(ts: i64, close: f64) -> MarketSnapshot {
        let candle = Candle {
            pair: "token_1/fiat".into(),
            timestamp: ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        };
        MarketSnapshot {
            timestamp: ts,
            candles: BTreeMap::from([("token_1/fiat".to_string(), candle)]),
        }
    }

    fn feed(strategy: &mut MeanReversion, closes: &[f64]) -> Vec<Option<OrderIntent>> {
        let balances = Balances::new();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let snap = snapshot(i as i64 * 60_000, c);
                strategy.on_tick(&MarketView::new(&snap, 0.0), &balances)
            })
            .collect()
    }

    #[test]
    fn silent_during_warmup() {
        let mut s = MeanReversion::new("token_1/fiat", 5, 1.0, 0.01);
        let out = feed(&mut s, &[100.0, 50.0, 150.0, 10.0]);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn buys_on_drop_and_sells_on_spike() {
        let mut s = MeanReversion::new("token_1/fiat", 5, 1.0, 0.01);
        let out = feed(&mut s, &[100.0, 100.0, 100.0, 100.0, 80.0]);
        let order = out[4].as_ref().unwrap();
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.quantity, 0.01);

        let mut s = MeanReversion::new("token_1/fiat", 5, 1.0, 0.01);
        let out = feed(&mut s, &[100.0, 100.0, 100.0, 100.0, 120.0]);
        assert_eq!(out[4].as_ref().unwrap().side, OrderSide::Sell);
    }

    #[test]
    fn flat_prices_do_nothing() {
        let mut s = MeanReversion::with_defaults("token_1/fiat");
        let out = feed(&mut s, &[100.0; 40]);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn ignores_snapshots_without_pair() {
        let mut s = MeanReversion::new("token_2/fiat", 2, 0.5, 0.01);
        let out = feed(&mut s, &[100.0, 200.0, 50.0]);
        assert!(out.iter().all(Option::is_none));
        assert!(s.closes.is_empty());
    }
}
