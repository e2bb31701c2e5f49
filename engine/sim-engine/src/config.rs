//! Configuration for the simulation engine

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::latency::LatencyProfile;
use crate::metrics::MarkingMethod;
use crate::{
    DEFAULT_CANCEL_THRESHOLD_TICKS, DEFAULT_COOLDOWN_BETWEEN_REQUOTES_US, DEFAULT_FILL_PROBABILITY,
    DEFAULT_MAX_INVENTORY, DEFAULT_MIN_VOLATILITY, DEFAULT_QUOTE_SIZE,
    DEFAULT_RETURN_BUCKET_INTERVAL_US, DEFAULT_SEED, DEFAULT_SPREAD_TICKS,
    DEFAULT_STARTING_MID_PRICE_TICKS, DEFAULT_STEP_US, DEFAULT_TICK_OFFSET, DEFAULT_VOLATILITY,
};

/// Ping-pong strategy parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Shares per ping order
    pub quote_size: u32,

    /// Distance from mid for ping orders, in ticks
    pub tick_offset: i64,

    /// Maximum absolute inventory
    pub max_inventory: i64,

    /// Ticks away from mid before a resting ping is cancelled
    pub cancel_threshold_ticks: i64,

    /// Minimum microseconds between requotes
    pub cooldown_between_requotes_us: i64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            quote_size: DEFAULT_QUOTE_SIZE,
            tick_offset: DEFAULT_TICK_OFFSET,
            max_inventory: DEFAULT_MAX_INVENTORY,
            cancel_threshold_ticks: DEFAULT_CANCEL_THRESHOLD_TICKS,
            cooldown_between_requotes_us: DEFAULT_COOLDOWN_BETWEEN_REQUOTES_US,
        }
    }
}

/// Synthetic market parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Initial mid price in ticks
    pub starting_mid_price_ticks: i64,

    /// Synthetic bid/ask spread in ticks
    pub spread_ticks: i64,

    /// Per-step price innovation standard deviation, in ticks
    pub volatility: f64,

    /// Lower bound applied to `volatility`
    pub min_volatility: f64,

    /// Base probability that a resting order at the mid fills per step
    pub fill_probability: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            starting_mid_price_ticks: DEFAULT_STARTING_MID_PRICE_TICKS,
            spread_ticks: DEFAULT_SPREAD_TICKS,
            volatility: DEFAULT_VOLATILITY,
            min_volatility: DEFAULT_MIN_VOLATILITY,
            fill_probability: DEFAULT_FILL_PROBABILITY,
        }
    }
}

/// P&L attribution parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub tick_size: f64,
    pub maker_rebate_per_share_ticks: i64,
    pub taker_fee_per_share_ticks: i64,
    pub return_bucket_interval_us: i64,
    pub marking_method: MarkingMethod,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            tick_size: 1.0,
            maker_rebate_per_share_ticks: 0,
            taker_fee_per_share_ticks: 0,
            return_bucket_interval_us: DEFAULT_RETURN_BUCKET_INTERVAL_US,
            marking_method: MarkingMethod::Mid,
        }
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub starting_timestamp_us: i64,
    pub ending_timestamp_us: i64,
    pub step_us: i64,

    /// Seed for the single shared PRNG. Identical config + seed gives
    /// byte-identical time series.
    pub seed: u64,

    pub strategy: StrategyConfig,
    pub market: MarketConfig,
    pub metrics: MetricsConfig,
    pub latency: LatencyProfile,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_timestamp_us: 1,
            ending_timestamp_us: 10_000_000,
            step_us: DEFAULT_STEP_US,
            seed: DEFAULT_SEED,
            strategy: StrategyConfig::default(),
            market: MarketConfig::default(),
            metrics: MetricsConfig::default(),
            latency: LatencyProfile::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.step_us <= 0 {
            return Err(SimError::Config(format!("step_us must be positive, got {}", self.step_us)));
        }
        if self.ending_timestamp_us < self.starting_timestamp_us {
            return Err(SimError::Config(format!(
                "ending timestamp {} precedes starting timestamp {}",
                self.ending_timestamp_us, self.starting_timestamp_us
            )));
        }

        let s = &self.strategy;
        if s.quote_size == 0 {
            return Err(SimError::Config("quote_size must be positive".into()));
        }
        if s.tick_offset <= 0 {
            return Err(SimError::Config("tick_offset must be positive".into()));
        }
        if s.max_inventory <= 0 {
            return Err(SimError::Config("max_inventory must be positive".into()));
        }
        if s.cancel_threshold_ticks < 0 {
            return Err(SimError::Config("cancel_threshold_ticks must be non-negative".into()));
        }
        if s.cooldown_between_requotes_us < 0 {
            return Err(SimError::Config(
                "cooldown_between_requotes_us must be non-negative".into(),
            ));
        }

        let m = &self.market;
        if m.starting_mid_price_ticks <= 0 {
            return Err(SimError::Config("starting_mid_price_ticks must be positive".into()));
        }
        if m.spread_ticks < 0 {
            return Err(SimError::Config("spread_ticks must be non-negative".into()));
        }
        if m.min_volatility <= 0.0 {
            return Err(SimError::Config("min_volatility must be positive".into()));
        }
        if !(0.0..=1.0).contains(&m.fill_probability) {
            return Err(SimError::Config(format!(
                "fill_probability must lie in [0, 1], got {}",
                m.fill_probability
            )));
        }

        let mx = &self.metrics;
        if mx.tick_size <= 0.0 {
            return Err(SimError::Config("tick_size must be positive".into()));
        }
        if mx.return_bucket_interval_us <= 0 {
            return Err(SimError::Config("return_bucket_interval_us must be positive".into()));
        }

        self.latency.validate()
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_horizon_and_step() {
        let mut cfg = SimConfig::default();
        cfg.step_us = 0;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));

        let mut cfg = SimConfig::default();
        cfg.ending_timestamp_us = cfg.starting_timestamp_us - 1;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_bad_strategy_and_market_parameters() {
        let mut cfg = SimConfig::default();
        cfg.strategy.quote_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.market.fill_probability = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.market.starting_mid_price_ticks = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = SimConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: SimConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.step_us, cfg.step_us);
        assert_eq!(back.seed, cfg.seed);
        assert_eq!(back.strategy.quote_size, cfg.strategy.quote_size);
        assert_eq!(back.latency, cfg.latency);
    }
}
