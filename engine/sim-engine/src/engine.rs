//! Top-level simulation driver: iterates the logical clock and owns the
//! market engine.

use matchbook::TsMicros;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::market::MarketEngine;

/// Owns the whole simulation and drives it from the starting to the
/// ending timestamp in fixed steps.
pub struct SimulationEngine {
    market: MarketEngine,
    starting_timestamp_us: TsMicros,
    ending_timestamp_us: TsMicros,
    step_us: TsMicros,
    current_timestamp_us: TsMicros,
}

impl SimulationEngine {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            market: MarketEngine::new(&config)?,
            starting_timestamp_us: config.starting_timestamp_us,
            ending_timestamp_us: config.ending_timestamp_us,
            step_us: config.step_us,
            current_timestamp_us: config.starting_timestamp_us,
        })
    }

    /// Run to completion, then finalize the metrics.
    pub fn run(&mut self) -> Result<(), SimError> {
        tracing::info!(
            starting_timestamp_us = self.starting_timestamp_us,
            ending_timestamp_us = self.ending_timestamp_us,
            step_us = self.step_us,
            "starting simulation"
        );

        let mut ts = self.starting_timestamp_us;
        while ts <= self.ending_timestamp_us {
            self.market.update(ts)?;
            self.current_timestamp_us = ts;
            ts += self.step_us;
        }

        self.finalize(self.ending_timestamp_us);
        tracing::info!(
            total_pnl_ticks = self.market.metrics().total_pnl_ticks(),
            trades = self.market.orderbook().trade_log().len(),
            "simulation complete"
        );
        Ok(())
    }

    /// Finalize the metrics. Idempotent after `run`.
    pub fn finalize(&mut self, final_timestamp_us: TsMicros) {
        self.market.metrics_mut().finalize(final_timestamp_us);
    }

    pub fn starting_timestamp_us(&self) -> TsMicros {
        self.starting_timestamp_us
    }

    pub fn current_timestamp_us(&self) -> TsMicros {
        self.current_timestamp_us
    }

    pub fn ending_timestamp_us(&self) -> TsMicros {
        self.ending_timestamp_us
    }

    pub fn step_us(&self) -> TsMicros {
        self.step_us
    }

    pub fn market_engine(&self) -> &MarketEngine {
        &self.market
    }

    pub fn market_engine_mut(&mut self) -> &mut MarketEngine {
        &mut self.market
    }
}
