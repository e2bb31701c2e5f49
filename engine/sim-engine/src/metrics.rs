//! P&L attribution and risk statistics, driven by the same event stream
//! as the strategy.

use std::collections::HashMap;

use matchbook::{OrderId, PriceTick, Qty, Side, TsMicros};
use serde::{Deserialize, Serialize};

use crate::config::MetricsConfig;

/// Trading days per year used for annualizing the Sharpe ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Trading hours per day used for annualizing the Sharpe ratio.
pub const HOURS_PER_DAY: f64 = 6.5;

/// How the mark price is derived from the quote stream. Discriminants
/// are part of the external contract.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MarkingMethod {
    Mid = 0,
    Last = 1,
}

/// Arrival context cached per live order, consumed by fill attribution.
#[derive(Debug, Clone, Copy)]
pub struct OrderCacheData {
    pub side: Side,
    pub arrival_mark_price_ticks: PriceTick,
    pub arrival_timestamp_us: TsMicros,
    pub intended_quantity: Qty,
    pub remaining_qty: Qty,
    pub is_ioc: bool,
}

/// Parallel time-series sampled once per market update.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSeries {
    pub timestamps_us: Vec<TsMicros>,
    pub total_pnl_ticks: Vec<i64>,
    pub realized_pnl_ticks: Vec<i64>,
    pub unrealized_pnl_ticks: Vec<i64>,
    pub spread_ticks: Vec<i64>,
    pub market_price_ticks: Vec<i64>,
    /// Per-bucket P&L changes, the basis for volatility and Sharpe.
    pub returns_ticks: Vec<i64>,
}

/// Accumulates position, P&L, fill and risk statistics.
///
/// All money-like state is in integer ticks; only ratios, volatility and
/// the Sharpe ratio are floating-point. Ratio denominators of zero
/// produce the documented sentinel (0, or infinity for the profit
/// factor), never NaN.
pub struct Metrics {
    config: MetricsConfig,

    position: i64,
    average_entry_price_ticks: i64,
    realized_pnl_ticks: i64,
    unrealized_pnl_ticks: i64,
    total_pnl_ticks: i64,
    fees_ticks: i64,

    gross_traded_qty: u64,
    resting_attempted_qty: u64,
    resting_filled_qty: u64,
    resting_cancelled_qty: u64,
    total_slippage_ticks: i64,

    equity_peak_ticks: i64,
    max_drawdown_ticks: i64,

    gross_profit_ticks: i64,
    gross_loss_ticks: i64,
    winning_trades: u64,
    losing_trades: u64,

    current_best_bid_ticks: PriceTick,
    current_best_ask_ticks: PriceTick,
    last_trade_price_ticks: PriceTick,
    last_mark_price_ticks: PriceTick,

    // -1 until the first sample opens a bucket
    return_bucket_start_us: TsMicros,
    return_bucket_start_pnl_ticks: i64,

    order_cache: HashMap<OrderId, OrderCacheData>,
    series: MetricsSeries,

    volatility: f64,
    sharpe_ratio: f64,
    win_rate: f64,
    profit_factor: f64,
    finalized: bool,
}

impl Metrics {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            position: 0,
            average_entry_price_ticks: 0,
            realized_pnl_ticks: 0,
            unrealized_pnl_ticks: 0,
            total_pnl_ticks: 0,
            fees_ticks: 0,
            gross_traded_qty: 0,
            resting_attempted_qty: 0,
            resting_filled_qty: 0,
            resting_cancelled_qty: 0,
            total_slippage_ticks: 0,
            equity_peak_ticks: 0,
            max_drawdown_ticks: 0,
            gross_profit_ticks: 0,
            gross_loss_ticks: 0,
            winning_trades: 0,
            losing_trades: 0,
            current_best_bid_ticks: 0,
            current_best_ask_ticks: 0,
            last_trade_price_ticks: 0,
            last_mark_price_ticks: 0,
            return_bucket_start_us: -1,
            return_bucket_start_pnl_ticks: 0,
            order_cache: HashMap::new(),
            series: MetricsSeries::default(),
            volatility: 0.0,
            sharpe_ratio: 0.0,
            win_rate: 0.0,
            profit_factor: 0.0,
            finalized: false,
        }
    }

    pub fn set_config(&mut self, config: MetricsConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Return to the post-construction state, keeping the config.
    pub fn reset(&mut self) {
        *self = Metrics::new(self.config);
    }

    // ------------------------------------------------------------------
    // Event hooks
    // ------------------------------------------------------------------

    pub fn on_order_placed(
        &mut self,
        order_id: OrderId,
        side: Side,
        mark_price_ticks: PriceTick,
        ts: TsMicros,
        intended_qty: Qty,
        is_ioc: bool,
    ) {
        self.order_cache.insert(
            order_id,
            OrderCacheData {
                side,
                arrival_mark_price_ticks: mark_price_ticks,
                arrival_timestamp_us: ts,
                intended_quantity: intended_qty,
                remaining_qty: intended_qty,
                is_ioc,
            },
        );
        if !is_ioc {
            self.resting_attempted_qty += u64::from(intended_qty);
        }
    }

    pub fn on_order_cancelled(&mut self, order_id: OrderId, cancelled_qty: Qty) {
        self.resting_cancelled_qty += u64::from(cancelled_qty);
        self.order_cache.remove(&order_id);
    }

    pub fn on_fill(
        &mut self,
        order_id: OrderId,
        fill_qty: Qty,
        fill_price_ticks: PriceTick,
        is_maker: bool,
        ts: TsMicros,
    ) {
        let Some(cache) = self.order_cache.get_mut(&order_id) else {
            tracing::warn!(order_id, "fill for order with no cached arrival context");
            return;
        };
        let side = cache.side;
        let arrival_mark = cache.arrival_mark_price_ticks;
        let is_ioc = cache.is_ioc;
        cache.remaining_qty = cache.remaining_qty.saturating_sub(fill_qty);
        if cache.remaining_qty == 0 {
            self.order_cache.remove(&order_id);
        }

        let qty = i64::from(fill_qty);
        let delta = match side {
            Side::Buy => qty,
            Side::Sell => -qty,
        };

        let old_pos = self.position;
        let mut realized = 0i64;
        if old_pos == 0 || (old_pos > 0) == (delta > 0) {
            // Increase: weighted average entry.
            let total = old_pos.abs() + qty;
            self.average_entry_price_ticks =
                (self.average_entry_price_ticks * old_pos.abs() + fill_price_ticks * qty) / total;
            self.position = old_pos + delta;
        } else if qty <= old_pos.abs() {
            // Decrease: realize against the average entry.
            realized =
                (fill_price_ticks - self.average_entry_price_ticks) * qty * old_pos.signum();
            self.position = old_pos + delta;
            if self.position == 0 {
                self.average_entry_price_ticks = 0;
            }
        } else {
            // Reversal: close the whole old position, open the residual
            // on the new side at the fill price.
            let closed = old_pos.abs();
            realized =
                (fill_price_ticks - self.average_entry_price_ticks) * closed * old_pos.signum();
            self.position = old_pos + delta;
            self.average_entry_price_ticks = fill_price_ticks;
        }
        self.realized_pnl_ticks += realized;

        if is_maker {
            self.fees_ticks -= self.config.maker_rebate_per_share_ticks * qty;
        } else {
            self.fees_ticks += self.config.taker_fee_per_share_ticks * qty;
        }

        self.total_slippage_ticks += (fill_price_ticks - arrival_mark).abs() * qty;
        self.gross_traded_qty += u64::from(fill_qty);
        if !is_ioc {
            self.resting_filled_qty += u64::from(fill_qty);
        }

        if realized > 0 {
            self.gross_profit_ticks += realized;
            self.winning_trades += 1;
        } else if realized < 0 {
            self.gross_loss_ticks += -realized;
            self.losing_trades += 1;
        }

        tracing::trace!(
            order_id,
            fill_qty,
            fill_price_ticks,
            is_maker,
            ts,
            position = self.position,
            realized,
            "fill"
        );
    }

    /// Mark the book and append a time-series sample.
    pub fn on_market_price_update(
        &mut self,
        ts: TsMicros,
        best_bid_ticks: PriceTick,
        best_ask_ticks: PriceTick,
        last_trade_price_ticks: Option<PriceTick>,
    ) {
        self.current_best_bid_ticks = best_bid_ticks;
        self.current_best_ask_ticks = best_ask_ticks;
        if let Some(last) = last_trade_price_ticks {
            self.last_trade_price_ticks = last;
        }

        self.last_mark_price_ticks = match self.config.marking_method {
            MarkingMethod::Mid => (best_bid_ticks + best_ask_ticks) / 2,
            // Falls back to the mid until the first trade prints.
            MarkingMethod::Last if self.last_trade_price_ticks > 0 => self.last_trade_price_ticks,
            MarkingMethod::Last => (best_bid_ticks + best_ask_ticks) / 2,
        };

        self.take_screenshot(ts);
    }

    /// Append a time-series sample at `ts` from current state: recompute
    /// unrealized/total P&L, advance peak equity, drawdown, and return
    /// buckets.
    pub fn take_screenshot(&mut self, ts: TsMicros) {
        self.unrealized_pnl_ticks = if self.position != 0 {
            self.position * (self.last_mark_price_ticks - self.average_entry_price_ticks)
        } else {
            0
        };
        self.total_pnl_ticks = self.realized_pnl_ticks + self.unrealized_pnl_ticks - self.fees_ticks;

        self.series.timestamps_us.push(ts);
        self.series.total_pnl_ticks.push(self.total_pnl_ticks);
        self.series.realized_pnl_ticks.push(self.realized_pnl_ticks);
        self.series.unrealized_pnl_ticks.push(self.unrealized_pnl_ticks);
        self.series.spread_ticks.push(self.current_best_ask_ticks - self.current_best_bid_ticks);
        self.series.market_price_ticks.push(self.last_mark_price_ticks);

        if self.total_pnl_ticks > self.equity_peak_ticks {
            self.equity_peak_ticks = self.total_pnl_ticks;
        }
        let drawdown = self.equity_peak_ticks - self.total_pnl_ticks;
        if drawdown > self.max_drawdown_ticks {
            self.max_drawdown_ticks = drawdown;
        }

        if self.return_bucket_start_us < 0 {
            self.return_bucket_start_us = ts;
            self.return_bucket_start_pnl_ticks = self.total_pnl_ticks;
        } else {
            while ts >= self.return_bucket_start_us + self.config.return_bucket_interval_us {
                self.series
                    .returns_ticks
                    .push(self.total_pnl_ticks - self.return_bucket_start_pnl_ticks);
                self.return_bucket_start_us += self.config.return_bucket_interval_us;
                self.return_bucket_start_pnl_ticks = self.total_pnl_ticks;
            }
        }
    }

    /// Compute the derived statistics. Idempotent: calling again after
    /// the first finalization is a no-op.
    pub fn finalize(&mut self, final_ts: TsMicros) {
        if self.finalized {
            return;
        }

        // Close the in-progress bucket.
        if self.return_bucket_start_us >= 0 && final_ts > self.return_bucket_start_us {
            self.series
                .returns_ticks
                .push(self.total_pnl_ticks - self.return_bucket_start_pnl_ticks);
            self.return_bucket_start_us = final_ts;
            self.return_bucket_start_pnl_ticks = self.total_pnl_ticks;
        }

        let returns = &self.series.returns_ticks;
        let n = returns.len();
        self.volatility = if n >= 2 {
            let mean = returns.iter().sum::<i64>() as f64 / n as f64;
            let var = returns.iter().map(|&r| (r as f64 - mean).powi(2)).sum::<f64>()
                / (n as f64 - 1.0);
            var.sqrt()
        } else {
            0.0
        };

        self.sharpe_ratio = if self.volatility > 0.0 {
            let mean = returns.iter().sum::<i64>() as f64 / n as f64;
            let buckets_per_year = TRADING_DAYS_PER_YEAR * HOURS_PER_DAY * 3600.0 * 1e6
                / self.config.return_bucket_interval_us as f64;
            (mean / self.volatility) * buckets_per_year.sqrt()
        } else {
            0.0
        };

        let decided = self.winning_trades + self.losing_trades;
        self.win_rate =
            if decided > 0 { self.winning_trades as f64 / decided as f64 } else { 0.0 };

        self.profit_factor = if self.gross_loss_ticks > 0 {
            self.gross_profit_ticks as f64 / self.gross_loss_ticks as f64
        } else if self.gross_profit_ticks > 0 {
            f64::INFINITY
        } else {
            0.0
        };

        self.finalized = true;
        tracing::info!(
            total_pnl_ticks = self.total_pnl_ticks,
            realized_pnl_ticks = self.realized_pnl_ticks,
            sharpe_ratio = self.sharpe_ratio,
            max_drawdown_ticks = self.max_drawdown_ticks,
            win_rate = self.win_rate,
            "metrics finalized"
        );
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn average_entry_price_ticks(&self) -> i64 {
        self.average_entry_price_ticks
    }

    pub fn realized_pnl_ticks(&self) -> i64 {
        self.realized_pnl_ticks
    }

    pub fn unrealized_pnl_ticks(&self) -> i64 {
        self.unrealized_pnl_ticks
    }

    pub fn total_pnl_ticks(&self) -> i64 {
        self.total_pnl_ticks
    }

    pub fn fees_ticks(&self) -> i64 {
        self.fees_ticks
    }

    pub fn gross_traded_qty(&self) -> u64 {
        self.gross_traded_qty
    }

    pub fn resting_attempted_qty(&self) -> u64 {
        self.resting_attempted_qty
    }

    pub fn resting_filled_qty(&self) -> u64 {
        self.resting_filled_qty
    }

    pub fn resting_cancelled_qty(&self) -> u64 {
        self.resting_cancelled_qty
    }

    pub fn total_slippage_ticks(&self) -> i64 {
        self.total_slippage_ticks
    }

    /// Filled share of attempted resting quantity; 0 when nothing was
    /// attempted.
    pub fn fill_ratio(&self) -> f64 {
        if self.resting_attempted_qty > 0 {
            self.resting_filled_qty as f64 / self.resting_attempted_qty as f64
        } else {
            0.0
        }
    }

    pub fn max_drawdown_ticks(&self) -> i64 {
        self.max_drawdown_ticks
    }

    pub fn equity_peak_ticks(&self) -> i64 {
        self.equity_peak_ticks
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn sharpe_ratio(&self) -> f64 {
        self.sharpe_ratio
    }

    pub fn gross_profit_ticks(&self) -> i64 {
        self.gross_profit_ticks
    }

    pub fn gross_loss_ticks(&self) -> i64 {
        self.gross_loss_ticks
    }

    pub fn win_rate(&self) -> f64 {
        self.win_rate
    }

    pub fn profit_factor(&self) -> f64 {
        self.profit_factor
    }

    pub fn last_mark_price_ticks(&self) -> PriceTick {
        self.last_mark_price_ticks
    }

    pub fn last_trade_price_ticks(&self) -> PriceTick {
        self.last_trade_price_ticks
    }

    pub fn current_best_bid_ticks(&self) -> PriceTick {
        self.current_best_bid_ticks
    }

    pub fn current_best_ask_ticks(&self) -> PriceTick {
        self.current_best_ask_ticks
    }

    pub fn order_cache(&self) -> &HashMap<OrderId, OrderCacheData> {
        &self.order_cache
    }

    pub fn series(&self) -> &MetricsSeries {
        &self.series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> Metrics {
        Metrics::new(MetricsConfig::default())
    }

    fn metrics_with_fees(rebate: i64, fee: i64) -> Metrics {
        let config = MetricsConfig {
            maker_rebate_per_share_ticks: rebate,
            taker_fee_per_share_ticks: fee,
            ..MetricsConfig::default()
        };
        Metrics::new(config)
    }

    fn place_and_fill(m: &mut Metrics, id: OrderId, side: Side, qty: Qty, price: i64, ts: i64) {
        m.on_order_placed(id, side, price, ts, qty, false);
        m.on_fill(id, qty, price, true, ts);
    }

    #[test]
    fn weighted_average_entry_on_increases() {
        let mut m = metrics();
        place_and_fill(&mut m, 1, Side::Buy, 2, 100, 1);
        place_and_fill(&mut m, 2, Side::Buy, 2, 110, 2);

        assert_eq!(m.position(), 4);
        assert_eq!(m.average_entry_price_ticks(), 105);
        assert_eq!(m.realized_pnl_ticks(), 0);
    }

    #[test]
    fn decrease_realizes_against_average_entry() {
        let mut m = metrics();
        place_and_fill(&mut m, 1, Side::Buy, 3, 100, 1);
        place_and_fill(&mut m, 2, Side::Sell, 2, 104, 2);

        assert_eq!(m.position(), 1);
        assert_eq!(m.realized_pnl_ticks(), 8); // (104-100) * 2
        assert_eq!(m.average_entry_price_ticks(), 100);
        assert_eq!(m.gross_profit_ticks(), 8);

        place_and_fill(&mut m, 3, Side::Sell, 1, 97, 3);
        assert_eq!(m.position(), 0);
        assert_eq!(m.realized_pnl_ticks(), 5); // 8 - 3
        assert_eq!(m.gross_loss_ticks(), 3);
        assert_eq!(m.average_entry_price_ticks(), 0);
    }

    #[test]
    fn reversal_closes_then_reopens_at_fill_price() {
        let mut m = metrics();
        place_and_fill(&mut m, 1, Side::Buy, 2, 100, 1);
        place_and_fill(&mut m, 2, Side::Sell, 5, 106, 2);

        assert_eq!(m.position(), -3);
        assert_eq!(m.realized_pnl_ticks(), 12); // (106-100) * 2
        assert_eq!(m.average_entry_price_ticks(), 106);
    }

    #[test]
    fn short_side_realization() {
        let mut m = metrics();
        place_and_fill(&mut m, 1, Side::Sell, 4, 100, 1);
        place_and_fill(&mut m, 2, Side::Buy, 4, 97, 2);

        assert_eq!(m.position(), 0);
        assert_eq!(m.realized_pnl_ticks(), 12); // short 4 @ 100, cover @ 97
    }

    #[test]
    fn maker_rebate_and_taker_fee_flow_through_fees() {
        let mut m = metrics_with_fees(1, 2);
        m.on_order_placed(1, Side::Buy, 100, 1, 5, false);
        m.on_fill(1, 5, 100, true, 1);
        assert_eq!(m.fees_ticks(), -5); // rebate credits

        m.on_order_placed(2, Side::Sell, 100, 2, 5, true);
        m.on_fill(2, 5, 100, false, 2);
        assert_eq!(m.fees_ticks(), -5 + 10); // taker fee debits
    }

    #[test]
    fn slippage_accumulates_against_arrival_mark() {
        let mut m = metrics();
        m.on_order_placed(1, Side::Buy, 100, 1, 2, false);
        m.on_fill(1, 2, 97, true, 5);
        assert_eq!(m.total_slippage_ticks(), 6); // |97-100| * 2
    }

    #[test]
    fn resting_counters_and_fill_ratio() {
        let mut m = metrics();
        m.on_order_placed(1, Side::Buy, 100, 1, 10, false);
        m.on_order_placed(2, Side::Sell, 100, 1, 10, false);
        m.on_order_placed(3, Side::Buy, 100, 1, 4, true); // IOC not attempted

        assert_eq!(m.resting_attempted_qty(), 20);
        m.on_fill(1, 10, 99, true, 2);
        m.on_order_cancelled(2, 10);

        assert_eq!(m.resting_filled_qty(), 10);
        assert_eq!(m.resting_cancelled_qty(), 10);
        assert!(m.resting_attempted_qty() >= m.resting_filled_qty() + m.resting_cancelled_qty());
        assert!((m.fill_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn pnl_identity_holds_at_every_sample() {
        let mut m = metrics_with_fees(0, 1);
        m.on_order_placed(1, Side::Buy, 100, 1, 3, false);
        m.on_fill(1, 3, 99, false, 1);
        for (i, mark) in [(0i64, 100i64), (1, 103), (2, 95), (3, 99)] {
            m.on_market_price_update(1000 + i, mark - 1, mark + 1, None);
        }
        let s = m.series();
        for i in 0..s.timestamps_us.len() {
            assert_eq!(
                s.total_pnl_ticks[i],
                s.realized_pnl_ticks[i] + s.unrealized_pnl_ticks[i] - m.fees_ticks()
            );
        }
    }

    #[test]
    fn drawdown_is_nonnegative_and_nondecreasing() {
        let mut m = metrics();
        m.on_order_placed(1, Side::Buy, 100, 1, 1, false);
        m.on_fill(1, 1, 100, true, 1);

        let mut last_dd = 0;
        for (i, mark) in [(0i64, 110i64), (1, 90), (2, 120), (3, 80)] {
            m.on_market_price_update(1000 + i, mark - 1, mark + 1, None);
            assert!(m.max_drawdown_ticks() >= 0);
            assert!(m.max_drawdown_ticks() >= last_dd);
            last_dd = m.max_drawdown_ticks();
        }
        assert_eq!(m.max_drawdown_ticks(), 40); // peak +20 at 120, trough -20 at 80
    }

    #[test]
    fn return_buckets_advance_on_boundaries() {
        let config =
            MetricsConfig { return_bucket_interval_us: 100, ..MetricsConfig::default() };
        let mut m = Metrics::new(config);
        m.on_order_placed(1, Side::Buy, 100, 0, 1, false);
        m.on_fill(1, 1, 100, true, 0);

        m.on_market_price_update(0, 99, 101, None); // opens bucket at 0
        m.on_market_price_update(50, 104, 106, None); // same bucket
        m.on_market_price_update(100, 109, 111, None); // closes bucket [0,100)
        m.on_market_price_update(200, 99, 101, None); // closes bucket [100,200)

        assert_eq!(m.series().returns_ticks, vec![10, -10]);
    }

    #[test]
    fn marking_method_last_falls_back_to_mid() {
        let config = MetricsConfig { marking_method: MarkingMethod::Last, ..Default::default() };
        let mut m = Metrics::new(config);

        m.on_market_price_update(1, 99, 101, None);
        assert_eq!(m.last_mark_price_ticks(), 100);

        m.on_market_price_update(2, 99, 101, Some(104));
        assert_eq!(m.last_mark_price_ticks(), 104);
    }

    #[test]
    fn finalize_is_idempotent() {
        let config =
            MetricsConfig { return_bucket_interval_us: 100, ..MetricsConfig::default() };
        let mut m = Metrics::new(config);
        m.on_order_placed(1, Side::Buy, 100, 0, 1, false);
        m.on_fill(1, 1, 100, true, 0);
        m.on_market_price_update(0, 99, 101, None);
        m.on_market_price_update(100, 109, 111, None);
        m.on_market_price_update(150, 99, 101, None);

        m.finalize(200);
        let vol = m.volatility();
        let sharpe = m.sharpe_ratio();
        let returns = m.series().returns_ticks.clone();

        m.finalize(200);
        m.finalize(400);
        assert_eq!(m.volatility(), vol);
        assert_eq!(m.sharpe_ratio(), sharpe);
        assert_eq!(m.series().returns_ticks, returns);
    }

    #[test]
    fn degenerate_ratios_are_sentinels_not_nan() {
        let mut m = metrics();
        m.finalize(1);
        assert_eq!(m.volatility(), 0.0);
        assert_eq!(m.sharpe_ratio(), 0.0);
        assert_eq!(m.win_rate(), 0.0);
        assert_eq!(m.profit_factor(), 0.0);
        assert_eq!(m.fill_ratio(), 0.0);

        // Profit with zero loss reports infinite profit factor.
        let mut m = metrics();
        place_and_fill(&mut m, 1, Side::Buy, 1, 100, 1);
        place_and_fill(&mut m, 2, Side::Sell, 1, 105, 2);
        m.finalize(3);
        assert!(m.profit_factor().is_infinite());
        assert_eq!(m.win_rate(), 1.0);
    }

    #[test]
    fn reset_returns_to_initial_state_keeping_config() {
        let mut m = metrics_with_fees(1, 2);
        place_and_fill(&mut m, 1, Side::Buy, 2, 100, 1);
        m.on_market_price_update(10, 99, 101, None);
        m.finalize(20);

        m.reset();
        assert_eq!(m.position(), 0);
        assert_eq!(m.total_pnl_ticks(), 0);
        assert!(m.series().timestamps_us.is_empty());
        assert_eq!(m.config().maker_rebate_per_share_ticks, 1);

        // Usable again after reset.
        place_and_fill(&mut m, 2, Side::Buy, 1, 50, 30);
        assert_eq!(m.position(), 1);
    }
}
