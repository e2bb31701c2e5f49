//! # sim-engine
//!
//! Discrete-time simulator for a high-frequency ping-pong market-making
//! strategy. A synthetic random-walk price process drives probabilistic
//! fills against the strategy's resting orders in a
//! price-time-priority book, with every strategy action deferred
//! through a sampled-latency queue. A metrics engine attributes
//! realized/unrealized P&L, fill ratios, drawdown, volatility and the
//! Sharpe ratio from the same event stream.
//!
//! The whole simulation is single-threaded and deterministic: one
//! seedable PRNG feeds the price process, the fill sampling and the
//! latency model in a fixed per-tick order, so identical configs
//! produce byte-identical time series.

pub mod config;
pub mod engine;
pub mod error;
pub mod latency;
pub mod market;
pub mod metrics;
pub mod strategy;

#[cfg(test)]
mod integration_tests;

pub use config::{MarketConfig, MetricsConfig, SimConfig, StrategyConfig};
pub use engine::SimulationEngine;
pub use error::SimError;
pub use latency::{Action, ActionType, LatencyBounds, LatencyProfile, LatencyQueue, QuoteRole};
pub use market::MarketEngine;
pub use metrics::{MarkingMethod, Metrics, MetricsSeries, OrderCacheData};
pub use strategy::{PongEntry, Strategy, StrategyState};

/// Re-export commonly used types
pub use matchbook::{Order, OrderBook, OrderId, PriceTick, Qty, Side, Trade, TsMicros};

/// Current version of the simulator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default shares per ping order
pub const DEFAULT_QUOTE_SIZE: u32 = 1;

/// Default distance from mid for ping orders, in ticks
pub const DEFAULT_TICK_OFFSET: i64 = 1;

/// Default maximum absolute inventory
pub const DEFAULT_MAX_INVENTORY: i64 = 10;

/// Default stale-quote cancel threshold, in ticks
pub const DEFAULT_CANCEL_THRESHOLD_TICKS: i64 = 1;

/// Default minimum microseconds between requotes
pub const DEFAULT_COOLDOWN_BETWEEN_REQUOTES_US: i64 = 1;

/// Default initial mid price, in ticks
pub const DEFAULT_STARTING_MID_PRICE_TICKS: i64 = 10_000;

/// Default synthetic spread, in ticks
pub const DEFAULT_SPREAD_TICKS: i64 = 2;

/// Default per-step price volatility, in ticks
pub const DEFAULT_VOLATILITY: f64 = 1.0;

/// Default volatility floor
pub const DEFAULT_MIN_VOLATILITY: f64 = 0.5;

/// Default base fill probability at the mid
pub const DEFAULT_FILL_PROBABILITY: f64 = 0.3;

/// Default simulation step (100us)
pub const DEFAULT_STEP_US: i64 = 100;

/// Default return-bucket interval (1s)
pub const DEFAULT_RETURN_BUCKET_INTERVAL_US: i64 = 1_000_000;

/// Default PRNG seed
pub const DEFAULT_SEED: u64 = 42;
