//! End-to-end engine scenarios: data → timeline → strategy → ledger → equity.

use std::path::PathBuf;
use tickarena_core::data::{generate_triangle, load_file, synchronize, CandleStore, SyntheticConfig};
use tickarena_core::domain::{Balances, Candle, MarketView, OrderIntent, OrderSide, Pair};
use tickarena_core::engine::{run_backtest, Engine, OrderRejected, RunConfig};
use tickarena_core::strategy::{
    create_strategy, Hold, MeanReversion, OrderRecord, Replay, Strategy, StrategySpec,
    TriangleArbitrage,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn single_pair(closes: &[f64]) -> CandleStore {
    CandleStore::from_candles(closes.iter().enumerate().map(|(i, &close)| Candle {
        pair: "token/fiat".into(),
        timestamp: i as i64 * 60_000,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
    }))
}

/// Buys once at a given tick index.
struct BuyOnce {
    at: usize,
    tick: usize,
}

impl Strategy for BuyOnce {
    fn name(&self) -> &str {
        "buy_once"
    }

    fn on_tick(&mut self, market: &MarketView<'_>, _balances: &Balances) -> Option<OrderIntent> {
        let tick = self.tick;
        self.tick += 1;
        (tick == self.at && market.close("token/fiat").is_some())
            .then(|| OrderIntent::buy("token/fiat", 1.0))
    }
}

fn triangle_config() -> RunConfig {
    RunConfig::from_bps(
        "fiat",
        2.0,
        [("fiat", 10_000.0), ("token_1", 1.0), ("token_2", 1.0)]
            .into_iter()
            .collect(),
    )
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn single_pair_buy_scenario() {
    let timeline = synchronize(&single_pair(&[100.0, 110.0, 105.0])).unwrap();
    let config = RunConfig::new(
        "fiat",
        0.0003,
        [("fiat", 1000.0), ("token", 0.0)].into_iter().collect(),
    );
    let result = run_backtest(&timeline, &config, &mut BuyOnce { at: 1, tick: 0 }).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert!(result.rejections.is_empty());
    let final_equity = result.final_equity().unwrap();
    assert!((final_equity - 994.967).abs() < 1e-9);
    assert!(final_equity < result.equity_curve[0].equity);
    assert!((result.final_balances.get("fiat") - 889.967).abs() < 1e-9);
    assert_eq!(result.final_balances.get("token"), 1.0);
}

#[test]
fn triangle_divergence_is_arbitraged() {
    let timeline = synchronize(
        &load_file(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/triangle.csv"))
            .unwrap(),
    )
    .unwrap();
    let mut strategy = TriangleArbitrage::new(&Pair::new("token_1", "token_2"), "fiat", 0.005, 1.0);
    let result = run_backtest(&timeline, &triangle_config(), &mut strategy).unwrap();

    // Only the 00:01 snapshot diverges by more than 0.5%
    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.pair, "token_1/token_2");
    assert_eq!(trade.side, OrderSide::Buy);
    assert_eq!(trade.price, 0.0496);
    // token_2 quote converted at token_2/fiat = 40000
    assert!((trade.notional_fiat - 0.0496 * 40_000.0).abs() < 1e-6);
    assert!(trade.fee_fiat > 0.0);

    assert_eq!(result.final_balances.get("token_1"), 2.0);
    assert!(result.final_balances.get("token_2") < 1.0);
}

#[test]
fn strategy_on_missing_pair_never_trades() {
    let timeline = synchronize(&single_pair(&[100.0, 101.0])).unwrap();
    let spec = StrategySpec::new("mean_reversion")
        .with_pair("token_9/fiat")
        .with_param("window", 2.0);
    let mut strategy = create_strategy(&spec, "fiat").unwrap();
    let result = run_backtest(&timeline, &RunConfig::default(), strategy.as_mut()).unwrap();
    assert!(result.trades.is_empty());
    assert_eq!(result.equity_curve.len(), 2);
}

#[test]
fn rejection_reasons_are_recorded() {
    let timeline = synchronize(&single_pair(&[100.0, 101.0, 102.0])).unwrap();
    let config = RunConfig::new("fiat", 0.0, [("fiat", 50.0)].into_iter().collect());
    let mut strategy = BuyOnce { at: 0, tick: 0 };
    let result = run_backtest(&timeline, &config, &mut strategy).unwrap();
    assert!(result.trades.is_empty());
    assert_eq!(result.rejections.len(), 1);
    assert!(matches!(
        result.rejections[0].reason,
        OrderRejected::InsufficientBalance { ref asset, .. } if asset == "fiat"
    ));
    assert_eq!(result.final_balances, result.initial_balances);
}

#[test]
fn runs_are_deterministic() {
    let store = generate_triangle(&SyntheticConfig {
        steps: 300,
        gap_probability: 0.1,
        ..Default::default()
    });
    let timeline = synchronize(&store).unwrap();
    let engine = Engine::new(&triangle_config()).unwrap();

    let a = engine.run(&timeline, &mut MeanReversion::new("token_1/fiat", 10, 1.0, 0.1));
    let b = engine.run(&timeline, &mut MeanReversion::new("token_1/fiat", 10, 1.0, 0.1));
    assert_eq!(a.equity_curve, b.equity_curve);
    assert_eq!(a.trades, b.trades);
    assert!(!a.trades.is_empty());
}

#[test]
fn replaying_accepted_orders_reproduces_trades() {
    let store = generate_triangle(&SyntheticConfig {
        steps: 400,
        ..Default::default()
    });
    let timeline = synchronize(&store).unwrap();
    let config = triangle_config();

    let original = run_backtest(
        &timeline,
        &config,
        &mut MeanReversion::new("token_1/fiat", 20, 1.5, 0.5),
    ).unwrap();
    let records: Vec<OrderRecord> = original
        .trades
        .iter()
        .map(|t| {
            OrderRecord::new(
                t.seq.to_string(),
                t.timestamp,
                &OrderIntent {
                    pair: t.pair.clone(),
                    side: t.side,
                    quantity: t.quantity,
                },
            )
        })
        .collect();

    let mut replay = Replay::from_records(&records).unwrap();
    let replayed = run_backtest(&timeline, &config, &mut replay).unwrap();
    assert_eq!(replayed.trades, original.trades);
    assert_eq!(replayed.equity_curve, original.equity_curve);
    assert!(replayed.rejections.is_empty());
}

#[test]
fn hold_matches_initial_balances() {
    let timeline = synchronize(&generate_triangle(&SyntheticConfig::default())).unwrap();
    let result = run_backtest(&timeline, &triangle_config(), &mut Hold).unwrap();
    assert_eq!(result.final_balances, result.initial_balances);
    assert_eq!(result.equity_curve.len(), timeline.len());
    assert_eq!(result.snapshot_count, 1_440);
}
