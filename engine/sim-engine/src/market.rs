//! Synthetic market: a bounded random walk with discrete jumps, plus
//! probabilistic fills against the strategy's resting orders.

use matchbook::{OrderBook, PriceTick, TsMicros};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::metrics::Metrics;
use crate::strategy::Strategy;

/// Probability of a discrete jump per step.
pub const JUMP_PROBABILITY: f64 = 0.01;
/// Jump magnitude bounds, in ticks.
pub const JUMP_MIN_TICKS: i64 = 2;
pub const JUMP_MAX_TICKS: i64 = 5;
/// Exponential decay of the fill probability per tick of distance
/// between the mid and a resting order.
pub const FILL_DECAY_PER_TICK: f64 = 0.5;

/// Owns the book, metrics and strategy, and drives one simulation tick
/// per `update` call.
///
/// The PRNG is shared between the price process and the latency queue;
/// its consumption order per tick is fixed (innovation, jump, fill
/// sampling in ascending order id, then latency samples), which makes
/// runs with the same seed byte-identical.
pub struct MarketEngine {
    book: OrderBook,
    metrics: Metrics,
    strategy: Strategy,
    rng: StdRng,

    mid_price_ticks: PriceTick,
    spread_ticks: i64,
    volatility: f64,
    min_volatility: f64,
    fill_probability: f64,
}

impl MarketEngine {
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            book: OrderBook::new(),
            metrics: Metrics::new(config.metrics),
            strategy: Strategy::new(config.strategy, config.latency)?,
            rng: StdRng::seed_from_u64(config.seed),
            mid_price_ticks: config.market.starting_mid_price_ticks,
            spread_ticks: config.market.spread_ticks,
            volatility: config.market.volatility.max(config.market.min_volatility),
            min_volatility: config.market.min_volatility,
            fill_probability: config.market.fill_probability,
        })
    }

    /// Run one simulation tick at `ts`: advance the price, sample fills
    /// for resting orders, mark the metrics, then let the strategy react
    /// and drain its latency queue.
    pub fn update(&mut self, ts: TsMicros) -> Result<(), SimError> {
        // 1. Random-walk innovation, clamped positive, plus rare jumps.
        let normal = Normal::new(0.0, self.volatility)
            .map_err(|e| SimError::Config(format!("invalid volatility: {e}")))?;
        let innovation = normal.sample(&mut self.rng).round() as i64;
        self.mid_price_ticks = (self.mid_price_ticks + innovation).max(1);
        if self.rng.gen::<f64>() < JUMP_PROBABILITY {
            let magnitude = self.rng.gen_range(JUMP_MIN_TICKS..=JUMP_MAX_TICKS);
            let up: bool = self.rng.gen();
            let jump = if up { magnitude } else { -magnitude };
            self.mid_price_ticks = (self.mid_price_ticks + jump).max(1);
        }

        // 2. Synthetic quote around the mid.
        let half = self.spread_ticks / 2;
        let best_bid = (self.mid_price_ticks - (self.spread_ticks - half)).max(1);
        let best_ask = self.mid_price_ticks + half;

        // 3. Probabilistic fills, distance-decayed, ascending order id.
        for (order_id, _side, price_tick, _qty) in self.book.resting_orders() {
            let distance = (self.mid_price_ticks - price_tick).abs();
            let p = self.fill_probability * (-FILL_DECAY_PER_TICK * distance as f64).exp();
            if self.rng.gen::<f64>() < p {
                if let Some(trade) = self.book.fill_resting_order(order_id, ts) {
                    self.metrics.on_fill(
                        order_id,
                        trade.quantity,
                        trade.price_tick,
                        true,
                        ts,
                    );
                    self.strategy.on_fill(&trade, &self.book, &mut self.rng);
                }
            }
        }

        // 4. Mark the metrics off the synthetic quote.
        let last_trade = self.book.trade_log().last().map(|t| t.price_tick);
        self.metrics.on_market_price_update(ts, best_bid, best_ask, last_trade);

        // 5. Strategy reaction, then apply whatever latency has released.
        self.strategy.on_market_update(ts, self.mid_price_ticks, &self.book, &mut self.rng);
        self.strategy.execute_latency_queue(ts, &mut self.book, &mut self.metrics, &mut self.rng)
    }

    pub fn market_price_ticks(&self) -> PriceTick {
        self.mid_price_ticks
    }

    pub fn spread(&self) -> i64 {
        self.spread_ticks
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Raise or lower the per-step volatility; the configured floor
    /// still applies.
    pub fn set_volatility(&mut self, volatility: f64) {
        self.volatility = volatility.max(self.min_volatility);
    }

    pub fn fill_probability(&self) -> f64 {
        self.fill_probability
    }

    pub fn orderbook(&self) -> &OrderBook {
        &self.book
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut Strategy {
        &mut self.strategy
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut Metrics {
        &mut self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketConfig;
    use crate::latency::LatencyProfile;

    fn engine(seed: u64) -> MarketEngine {
        let config = SimConfig { seed, latency: LatencyProfile::zero(), ..SimConfig::default() };
        MarketEngine::new(&config).unwrap()
    }

    #[test]
    fn update_advances_price_and_samples_metrics() {
        let mut eng = engine(1);
        for i in 0..50 {
            eng.update(1 + i * 100).unwrap();
        }
        assert!(eng.market_price_ticks() > 0);
        assert_eq!(eng.metrics().series().timestamps_us.len(), 50);
    }

    #[test]
    fn volatility_floor_holds() {
        let config = SimConfig {
            market: MarketConfig { volatility: 0.1, min_volatility: 0.5, ..Default::default() },
            ..SimConfig::default()
        };
        let mut eng = MarketEngine::new(&config).unwrap();
        assert_eq!(eng.volatility(), 0.5);
        eng.set_volatility(0.01);
        assert_eq!(eng.volatility(), 0.5);
        eng.set_volatility(2.0);
        assert_eq!(eng.volatility(), 2.0);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let mut a = engine(7);
        let mut b = engine(7);
        for i in 0..200 {
            let ts = 1 + i * 100;
            a.update(ts).unwrap();
            b.update(ts).unwrap();
            assert_eq!(a.market_price_ticks(), b.market_price_ticks());
        }
        assert_eq!(a.metrics().series(), b.metrics().series());
        assert_eq!(a.orderbook().snapshot(), b.orderbook().snapshot());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = engine(7);
        let mut b = engine(8);
        let mut any_diff = false;
        for i in 0..200 {
            let ts = 1 + i * 100;
            a.update(ts).unwrap();
            b.update(ts).unwrap();
            any_diff |= a.market_price_ticks() != b.market_price_ticks();
        }
        assert!(any_diff);
    }

    #[test]
    fn strategy_inventory_matches_signed_fills() {
        let mut eng = engine(42);
        for i in 0..500 {
            eng.update(1 + i * 100).unwrap();
        }
        let mut signed = 0i64;
        for t in eng.orderbook().trade_log().trades() {
            // Every trade leg belongs to the single participant except
            // the synthetic counterparty.
            if t.buy_order_id != matchbook::ORDER_ID_NONE {
                signed += i64::from(t.quantity);
            }
            if t.sell_order_id != matchbook::ORDER_ID_NONE {
                signed -= i64::from(t.quantity);
            }
        }
        assert_eq!(eng.strategy().current_inventory(), signed);
        assert_eq!(eng.metrics().position(), signed);
    }
}
