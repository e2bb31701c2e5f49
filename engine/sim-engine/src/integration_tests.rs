//! End-to-end simulation runs exercising the full kernel.

use crate::config::{MetricsConfig, SimConfig, StrategyConfig};
use crate::engine::SimulationEngine;
use crate::latency::LatencyProfile;

fn short_run_config(seed: u64) -> SimConfig {
    SimConfig {
        starting_timestamp_us: 1,
        ending_timestamp_us: 200_000, // 2000 steps
        step_us: 100,
        seed,
        strategy: StrategyConfig {
            quote_size: 2,
            tick_offset: 1,
            max_inventory: 5,
            cancel_threshold_ticks: 2,
            cooldown_between_requotes_us: 500,
        },
        metrics: MetricsConfig {
            maker_rebate_per_share_ticks: 0,
            taker_fee_per_share_ticks: 1,
            return_bucket_interval_us: 10_000,
            ..MetricsConfig::default()
        },
        ..SimConfig::default()
    }
}

#[test]
fn identical_seeds_produce_byte_identical_series() {
    let mut a = SimulationEngine::new(short_run_config(1234)).unwrap();
    let mut b = SimulationEngine::new(short_run_config(1234)).unwrap();
    a.run().unwrap();
    b.run().unwrap();

    let (ma, mb) = (a.market_engine().metrics(), b.market_engine().metrics());
    assert_eq!(ma.series(), mb.series());
    assert_eq!(ma.sharpe_ratio(), mb.sharpe_ratio());
    assert_eq!(ma.volatility(), mb.volatility());
    assert_eq!(ma.total_pnl_ticks(), mb.total_pnl_ticks());
    assert_eq!(
        a.market_engine().orderbook().trade_log().len(),
        b.market_engine().orderbook().trade_log().len()
    );
}

#[test]
fn different_seeds_produce_different_series() {
    let mut a = SimulationEngine::new(short_run_config(1)).unwrap();
    let mut b = SimulationEngine::new(short_run_config(2)).unwrap();
    a.run().unwrap();
    b.run().unwrap();

    assert_ne!(
        a.market_engine().metrics().series().market_price_ticks,
        b.market_engine().metrics().series().market_price_ticks
    );
}

#[test]
fn run_samples_every_step_and_respects_the_clock() {
    let mut engine = SimulationEngine::new(short_run_config(7)).unwrap();
    assert_eq!(engine.starting_timestamp_us(), 1);
    assert_eq!(engine.ending_timestamp_us(), 200_000);
    assert_eq!(engine.step_us(), 100);

    engine.run().unwrap();
    assert_eq!(engine.current_timestamp_us(), 199_901); // last ts <= end

    let series = engine.market_engine().metrics().series();
    assert_eq!(series.timestamps_us.len(), 2000);
    // Timestamps are strictly monotonic.
    for w in series.timestamps_us.windows(2) {
        assert!(w[0] < w[1]);
    }
}

#[test]
fn accounting_invariants_hold_after_a_run() {
    let mut engine = SimulationEngine::new(short_run_config(99)).unwrap();
    engine.run().unwrap();

    let market = engine.market_engine();
    let metrics = market.metrics();

    // A run this long at fill_prob 0.3 always trades.
    assert!(metrics.gross_traded_qty() > 0);

    assert!(
        metrics.resting_attempted_qty()
            >= metrics.resting_filled_qty() + metrics.resting_cancelled_qty()
    );
    assert!(metrics.max_drawdown_ticks() >= 0);
    assert_eq!(metrics.position(), market.strategy().current_inventory());

    // The book is never left crossed.
    if let (Some((bid, _)), Some((ask, _))) =
        (market.orderbook().best_bid(), market.orderbook().best_ask())
    {
        assert!(bid < ask);
    }

    // Final sample satisfies the P&L identity.
    let series = metrics.series();
    let last = series.timestamps_us.len() - 1;
    assert_eq!(
        series.total_pnl_ticks[last],
        series.realized_pnl_ticks[last] + series.unrealized_pnl_ticks[last]
            - metrics.fees_ticks()
    );
}

#[test]
fn finalize_after_run_is_idempotent() {
    let mut engine = SimulationEngine::new(short_run_config(5)).unwrap();
    engine.run().unwrap();

    let sharpe = engine.market_engine().metrics().sharpe_ratio();
    let returns = engine.market_engine().metrics().series().returns_ticks.clone();

    engine.finalize(engine.ending_timestamp_us());
    engine.finalize(engine.ending_timestamp_us() + 1_000_000);

    assert_eq!(engine.market_engine().metrics().sharpe_ratio(), sharpe);
    assert_eq!(engine.market_engine().metrics().series().returns_ticks, returns);
}

#[test]
fn zero_latency_run_leaves_consistent_book() {
    let mut config = short_run_config(11);
    config.latency = LatencyProfile::zero();
    let mut engine = SimulationEngine::new(config).unwrap();
    engine.run().unwrap();

    let market = engine.market_engine();
    // Orders only ever rest on the strategy's side of the synthetic
    // quote, so the book is never crossed and ids stay consistent.
    for (id, _side, price, qty) in market.orderbook().resting_orders() {
        assert!(price > 0);
        assert!(qty > 0);
        assert!(market.orderbook().order(id).is_some());
    }
    assert_eq!(
        market.metrics().position(),
        market.strategy().current_inventory()
    );
}
