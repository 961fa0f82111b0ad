//! Synthetic candle generation for demos, benchmarks and tests.
//!
//! Produces a seeded random walk for a three-pair triangle
//! (`token_1/fiat`, `token_2/fiat`, `token_1/token_2`). The cross pair tracks
//! the implied price `token_1/fiat ÷ token_2/fiat` with a configurable amount of
//! noise, so triangle divergences occur naturally. Output is deterministic for
//! a given seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::store::CandleStore;
use crate::domain::Candle;

pub const TOKEN_1_FIAT: &str = "token_1/fiat";
pub const TOKEN_2_FIAT: &str = "token_2/fiat";
pub const TOKEN_1_TOKEN_2: &str = "token_1/token_2";

/// Parameters for [`generate_triangle`].
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Number of timestamps to generate.
    pub steps: usize,
    pub start_ms: i64,
    pub interval_ms: i64,
    pub token_1_price: f64,
    pub token_2_price: f64,
    /// Maximum absolute per-step return of the fiat pairs.
    pub volatility: f64,
    /// Maximum relative deviation of the cross pair from its implied price.
    pub cross_noise: f64,
    /// Probability that a pair skips a given timestamp.
    pub gap_probability: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 1_440,
            start_ms: 1_704_067_200_000,
            interval_ms: 60_000,
            token_1_price: 2_000.0,
            token_2_price: 40_000.0,
            volatility: 0.002,
            cross_noise: 0.004,
            gap_probability: 0.0,
        }
    }
}

/// Generate a three-pair triangle store.
pub fn generate_triangle(config: &SyntheticConfig) -> CandleStore {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut store = CandleStore::new();

    let mut p1 = config.token_1_price;
    let mut p2 = config.token_2_price;
    let mut cross = p1 / p2;

    for step in 0..config.steps {
        let timestamp = config.start_ms + step as i64 * config.interval_ms;

        let open1 = p1;
        let open2 = p2;
        let open_cross = cross;
        p1 *= 1.0 + rng.gen_range(-config.volatility..=config.volatility);
        p2 *= 1.0 + rng.gen_range(-config.volatility..=config.volatility);
        cross = (p1 / p2) * (1.0 + rng.gen_range(-config.cross_noise..=config.cross_noise));

        for (pair, open, close) in [
            (TOKEN_1_FIAT, open1, p1),
            (TOKEN_2_FIAT, open2, p2),
            (TOKEN_1_TOKEN_2, open_cross, cross),
        ] {
            if config.gap_probability > 0.0 && rng.gen_bool(config.gap_probability.min(1.0)) {
                continue;
            }
            store.push(make_candle(&mut rng, pair, timestamp, open, close));
        }
    }

    store
}

/// Single-pair random walk, e.g. for one-asset strategies.
pub fn generate_pair(pair: &str, config: &SyntheticConfig) -> CandleStore {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut price = config.token_1_price;
    let candles: Vec<Candle> = (0..config.steps)
        .map(|step| {
            let open = price;
            price *= 1.0 + rng.gen_range(-config.volatility..=config.volatility);
            let timestamp = config.start_ms + step as i64 * config.interval_ms;
            make_candle(&mut rng, pair, timestamp, open, price)
        })
        .collect();
    CandleStore::from_candles(candles)
}

fn make_candle(rng: &mut StdRng, pair: &str, timestamp: i64, open: f64, close: f64) -> Candle {
    let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
    let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
    Candle {
        pair: pair.to_string(),
        timestamp,
        open,
        high,
        low,
        close,
        volume: rng.gen_range(1.0..100.0),
    }
}
