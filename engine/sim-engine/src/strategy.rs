//! Ping-pong quoting state machine.
//!
//! Pings rest `tick_offset` ticks either side of the mid; a filled ping
//! enqueues a pong on the opposite side two offsets away from the fill
//! price, capturing the spread. Every order action flows through the
//! latency queue.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use matchbook::{Order, OrderBook, OrderId, PriceTick, Qty, Side, Trade, TsMicros, ORDER_ID_NONE};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::error::SimError;
use crate::latency::{Action, LatencyProfile, LatencyQueue, QuoteRole};
use crate::metrics::Metrics;

/// Quoting posture. Discriminants are part of the external contract.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum StrategyState {
    WaitingToBuy = 0,
    WaitingToSell = 1,
    Balanced = 2,
}

/// A pending pong leg. `order_id` is the none sentinel until the
/// deferred send executes and the book assigns one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PongEntry {
    pub price_tick: PriceTick,
    pub order_id: OrderId,
    pub quantity: Qty,
}

pub struct Strategy {
    config: StrategyConfig,
    state: StrategyState,

    active_buy_order_id: OrderId,
    active_sell_order_id: OrderId,
    pending_buy_ping: bool,
    pending_sell_ping: bool,
    pending_cancels: BTreeSet<OrderId>,

    last_pinged_mid_price_ticks: PriceTick,
    last_quote_time_us: TsMicros,

    latency: LatencyQueue,

    /// Buy-pongs pop cheapest first, sell-pongs dearest first.
    buy_pongs: BinaryHeap<Reverse<PongEntry>>,
    sell_pongs: BinaryHeap<PongEntry>,

    ping_ids: BTreeSet<OrderId>,
    pong_ids: BTreeSet<OrderId>,

    /// Signed sum of this strategy's own fills.
    inventory: i64,

    current_market_price_ticks: PriceTick,
    cached_best_bid_ticks: Option<PriceTick>,
    cached_best_ask_ticks: Option<PriceTick>,
}

impl Strategy {
    pub fn new(config: StrategyConfig, latency: LatencyProfile) -> Result<Self, SimError> {
        Ok(Self {
            config,
            state: StrategyState::Balanced,
            active_buy_order_id: ORDER_ID_NONE,
            active_sell_order_id: ORDER_ID_NONE,
            pending_buy_ping: false,
            pending_sell_ping: false,
            pending_cancels: BTreeSet::new(),
            last_pinged_mid_price_ticks: 0,
            last_quote_time_us: 0,
            latency: LatencyQueue::new(latency)?,
            buy_pongs: BinaryHeap::new(),
            sell_pongs: BinaryHeap::new(),
            ping_ids: BTreeSet::new(),
            pong_ids: BTreeSet::new(),
            inventory: 0,
            current_market_price_ticks: 0,
            cached_best_bid_ticks: None,
            cached_best_ask_ticks: None,
        })
    }

    /// Per-tick quoting logic: cancel stale pings, re-quote missing
    /// sides within inventory limits. All resulting actions are
    /// scheduled through the latency queue, not applied here.
    pub fn on_market_update(
        &mut self,
        ts: TsMicros,
        market_price: PriceTick,
        book: &OrderBook,
        rng: &mut StdRng,
    ) {
        self.current_market_price_ticks = market_price;
        self.cached_best_bid_ticks = book.best_bid().map(|(p, _)| p);
        self.cached_best_ask_ticks = book.best_ask().map(|(p, _)| p);

        if ts - self.last_quote_time_us < self.config.cooldown_between_requotes_us {
            return;
        }

        let mid = book.mid_price().unwrap_or(market_price);

        for active_id in [self.active_buy_order_id, self.active_sell_order_id] {
            if active_id == ORDER_ID_NONE || self.pending_cancels.contains(&active_id) {
                continue;
            }
            if let Some(order) = book.order(active_id) {
                if (mid - order.price_tick).abs() > self.config.cancel_threshold_ticks {
                    tracing::debug!(
                        order_id = active_id,
                        price_tick = order.price_tick,
                        mid,
                        "cancelling stale ping"
                    );
                    self.pending_cancels.insert(active_id);
                    self.latency.schedule(Action::Cancel { order_id: active_id }, ts, rng);
                }
            }
        }

        let mut quoted = false;

        if self.active_buy_order_id == ORDER_ID_NONE
            && !self.pending_buy_ping
            && self.inventory < self.config.max_inventory
        {
            let room = self.config.max_inventory - self.inventory;
            let size = i64::from(self.config.quote_size).min(room);
            let price = mid - self.config.tick_offset;
            if size > 0 && price > 0 {
                self.pending_buy_ping = true;
                self.latency.schedule(
                    Action::OrderSend {
                        side: Side::Buy,
                        price_tick: price,
                        quantity: size as Qty,
                        role: QuoteRole::Ping,
                    },
                    ts,
                    rng,
                );
                quoted = true;
            }
        }

        if self.active_sell_order_id == ORDER_ID_NONE
            && !self.pending_sell_ping
            && self.inventory > -self.config.max_inventory
        {
            let room = self.config.max_inventory + self.inventory;
            let size = i64::from(self.config.quote_size).min(room);
            let price = mid + self.config.tick_offset;
            if size > 0 {
                self.pending_sell_ping = true;
                self.latency.schedule(
                    Action::OrderSend {
                        side: Side::Sell,
                        price_tick: price,
                        quantity: size as Qty,
                        role: QuoteRole::Ping,
                    },
                    ts,
                    rng,
                );
                quoted = true;
            }
        }

        if quoted {
            self.last_pinged_mid_price_ticks = mid;
            self.last_quote_time_us = ts;
        }
        self.update_state();
    }

    /// React to a trade touching this strategy's orders. Ping fills
    /// clear the active quote and schedule the offsetting pong; pong
    /// fills clear the pong bookkeeping.
    pub fn on_fill(&mut self, trade: &Trade, book: &OrderBook, rng: &mut StdRng) {
        let legs = [(trade.buy_order_id, Side::Buy), (trade.sell_order_id, Side::Sell)];
        for (order_id, leg_side) in legs {
            if order_id == ORDER_ID_NONE {
                continue;
            }
            let fully_filled = book.order(order_id).is_none();
            self.handle_own_fill(
                order_id,
                leg_side,
                trade.price_tick,
                trade.quantity,
                fully_filled,
                trade.timestamp_us,
                rng,
            );
        }
        self.update_state();
    }

    /// Apply every due action to the book, routing resulting fills and
    /// cancels into the metrics engine.
    pub fn execute_latency_queue(
        &mut self,
        ts: TsMicros,
        book: &mut OrderBook,
        metrics: &mut Metrics,
        rng: &mut StdRng,
    ) -> Result<(), SimError> {
        while let Some(action) = self.latency.pop_due(ts) {
            match action {
                Action::OrderSend { side, price_tick, quantity, role } => {
                    let mark = metrics.last_mark_price_ticks();
                    let outcome = book.add_limit_order(side, price_tick, quantity, ts)?;
                    metrics.on_order_placed(outcome.order_id, side, mark, ts, quantity, false);

                    match role {
                        QuoteRole::Ping => {
                            self.ping_ids.insert(outcome.order_id);
                            match side {
                                Side::Buy => {
                                    self.active_buy_order_id = outcome.order_id;
                                    self.pending_buy_ping = false;
                                }
                                Side::Sell => {
                                    self.active_sell_order_id = outcome.order_id;
                                    self.pending_sell_ping = false;
                                }
                            }
                        }
                        QuoteRole::Pong => {
                            self.pong_ids.insert(outcome.order_id);
                            self.assign_pong_id(side, price_tick, quantity, outcome.order_id);
                        }
                    }

                    for trade in &outcome.trades {
                        let legs =
                            [(trade.buy_order_id, Side::Buy), (trade.sell_order_id, Side::Sell)];
                        for (order_id, _) in legs {
                            if order_id == ORDER_ID_NONE {
                                continue;
                            }
                            let is_maker = order_id != outcome.order_id;
                            metrics.on_fill(
                                order_id,
                                trade.quantity,
                                trade.price_tick,
                                is_maker,
                                trade.timestamp_us,
                            );
                        }
                        self.on_fill(trade, book, rng);
                    }
                    self.update_state();
                }
                Action::Cancel { order_id } => {
                    self.pending_cancels.remove(&order_id);
                    let remaining = book.order(order_id).map(|o| o.quantity);
                    if book.cancel_order(order_id) {
                        metrics.on_order_cancelled(order_id, remaining.unwrap_or(0));
                        self.forget_order(order_id);
                    }
                    self.update_state();
                }
                Action::Modify { order_id, new_quantity } => {
                    book.modify_order(order_id, new_quantity, ts)?;
                }
                // Internal notification slots.
                Action::AcknowledgeFill { .. } | Action::MarketUpdate => {}
            }
        }
        Ok(())
    }

    fn handle_own_fill(
        &mut self,
        order_id: OrderId,
        leg_side: Side,
        price_tick: PriceTick,
        quantity: Qty,
        fully_filled: bool,
        ts: TsMicros,
        rng: &mut StdRng,
    ) {
        let is_ping = self.ping_ids.contains(&order_id);
        let is_pong = self.pong_ids.contains(&order_id);
        if !is_ping && !is_pong {
            return;
        }

        self.inventory += match leg_side {
            Side::Buy => i64::from(quantity),
            Side::Sell => -i64::from(quantity),
        };

        if is_ping {
            if fully_filled {
                self.ping_ids.remove(&order_id);
                if self.active_buy_order_id == order_id {
                    self.active_buy_order_id = ORDER_ID_NONE;
                }
                if self.active_sell_order_id == order_id {
                    self.active_sell_order_id = ORDER_ID_NONE;
                }
            }

            let (pong_side, pong_price) = match leg_side {
                Side::Buy => (Side::Sell, price_tick + 2 * self.config.tick_offset),
                Side::Sell => (Side::Buy, price_tick - 2 * self.config.tick_offset),
            };
            if pong_price > 0 && quantity > 0 {
                let entry =
                    PongEntry { price_tick: pong_price, order_id: ORDER_ID_NONE, quantity };
                match pong_side {
                    Side::Buy => self.buy_pongs.push(Reverse(entry)),
                    Side::Sell => self.sell_pongs.push(entry),
                }
                tracing::debug!(
                    ping_order_id = order_id,
                    pong_price,
                    quantity,
                    "ping filled, scheduling pong"
                );
                self.latency.schedule(
                    Action::OrderSend {
                        side: pong_side,
                        price_tick: pong_price,
                        quantity,
                        role: QuoteRole::Pong,
                    },
                    ts,
                    rng,
                );
            }
        } else if fully_filled {
            self.pong_ids.remove(&order_id);
            self.remove_pong_entry(order_id);
        }
    }

    fn update_state(&mut self) {
        let buy_live = self.active_buy_order_id != ORDER_ID_NONE || self.pending_buy_ping;
        let sell_live = self.active_sell_order_id != ORDER_ID_NONE || self.pending_sell_ping;
        self.state = match (buy_live, sell_live) {
            (true, false) => StrategyState::WaitingToBuy,
            (false, true) => StrategyState::WaitingToSell,
            _ => StrategyState::Balanced,
        };
    }

    fn forget_order(&mut self, order_id: OrderId) {
        self.ping_ids.remove(&order_id);
        if self.pong_ids.remove(&order_id) {
            self.remove_pong_entry(order_id);
        }
        if self.active_buy_order_id == order_id {
            self.active_buy_order_id = ORDER_ID_NONE;
        }
        if self.active_sell_order_id == order_id {
            self.active_sell_order_id = ORDER_ID_NONE;
        }
    }

    /// Attach the book-assigned id to the matching unassigned entry.
    fn assign_pong_id(&mut self, side: Side, price_tick: PriceTick, quantity: Qty, id: OrderId) {
        let matches = |e: &PongEntry| {
            e.order_id == ORDER_ID_NONE && e.price_tick == price_tick && e.quantity == quantity
        };
        match side {
            Side::Buy => {
                let mut entries: Vec<_> = self.buy_pongs.drain().map(|Reverse(e)| e).collect();
                if let Some(e) = entries.iter_mut().find(|e| matches(e)) {
                    e.order_id = id;
                }
                self.buy_pongs.extend(entries.into_iter().map(Reverse));
            }
            Side::Sell => {
                let mut entries: Vec<_> = self.sell_pongs.drain().collect();
                if let Some(e) = entries.iter_mut().find(|e| matches(e)) {
                    e.order_id = id;
                }
                self.sell_pongs.extend(entries);
            }
        }
    }

    fn remove_pong_entry(&mut self, order_id: OrderId) {
        let mut entries: Vec<_> = self.buy_pongs.drain().map(|Reverse(e)| e).collect();
        if let Some(pos) = entries.iter().position(|e| e.order_id == order_id) {
            entries.remove(pos);
            self.buy_pongs.extend(entries.into_iter().map(Reverse));
            return;
        }
        self.buy_pongs.extend(entries.into_iter().map(Reverse));

        let mut entries: Vec<_> = self.sell_pongs.drain().collect();
        if let Some(pos) = entries.iter().position(|e| e.order_id == order_id) {
            entries.remove(pos);
        }
        self.sell_pongs.extend(entries);
    }

    // ------------------------------------------------------------------
    // Market-state accessors (served from the last update's cache)
    // ------------------------------------------------------------------

    pub fn best_bid_ticks(&self) -> Option<PriceTick> {
        self.cached_best_bid_ticks
    }

    pub fn best_ask_ticks(&self) -> Option<PriceTick> {
        self.cached_best_ask_ticks
    }

    /// Mid of the cached quotes, falling back to the last market price
    /// when a side is empty.
    pub fn mid_price_ticks(&self) -> PriceTick {
        match (self.cached_best_bid_ticks, self.cached_best_ask_ticks) {
            (Some(bid), Some(ask)) => (bid + ask) / 2,
            _ => self.current_market_price_ticks,
        }
    }

    pub fn spread_ticks(&self) -> Option<PriceTick> {
        match (self.cached_best_bid_ticks, self.cached_best_ask_ticks) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn current_market_price_ticks(&self) -> PriceTick {
        self.current_market_price_ticks
    }

    pub fn current_inventory(&self) -> i64 {
        self.inventory
    }

    // ------------------------------------------------------------------
    // Parameter accessors
    // ------------------------------------------------------------------

    pub fn quote_size(&self) -> u32 {
        self.config.quote_size
    }

    pub fn set_quote_size(&mut self, value: u32) {
        self.config.quote_size = value;
    }

    pub fn tick_offset_from_mid(&self) -> i64 {
        self.config.tick_offset
    }

    pub fn set_tick_offset_from_mid(&mut self, value: i64) {
        self.config.tick_offset = value;
    }

    pub fn max_inventory(&self) -> i64 {
        self.config.max_inventory
    }

    pub fn set_max_inventory(&mut self, value: i64) {
        self.config.max_inventory = value;
    }

    pub fn cancel_threshold_ticks(&self) -> i64 {
        self.config.cancel_threshold_ticks
    }

    pub fn set_cancel_threshold_ticks(&mut self, value: i64) {
        self.config.cancel_threshold_ticks = value;
    }

    pub fn cooldown_between_requotes_us(&self) -> i64 {
        self.config.cooldown_between_requotes_us
    }

    pub fn set_cooldown_between_requotes_us(&mut self, value: i64) {
        self.config.cooldown_between_requotes_us = value;
    }

    // ------------------------------------------------------------------
    // Order-state accessors
    // ------------------------------------------------------------------

    pub fn active_buy_order_id(&self) -> OrderId {
        self.active_buy_order_id
    }

    pub fn active_sell_order_id(&self) -> OrderId {
        self.active_sell_order_id
    }

    pub fn last_pinged_mid_price_ticks(&self) -> PriceTick {
        self.last_pinged_mid_price_ticks
    }

    pub fn last_quote_time_us(&self) -> TsMicros {
        self.last_quote_time_us
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn set_active_buy_order_id(&mut self, value: OrderId) {
        self.active_buy_order_id = value;
    }

    pub fn set_active_sell_order_id(&mut self, value: OrderId) {
        self.active_sell_order_id = value;
    }

    pub fn set_last_pinged_mid_price_ticks(&mut self, value: PriceTick) {
        self.last_pinged_mid_price_ticks = value;
    }

    pub fn set_last_quote_time_us(&mut self, value: TsMicros) {
        self.last_quote_time_us = value;
    }

    pub fn set_state(&mut self, value: StrategyState) {
        self.state = value;
    }

    /// Data for the active buy ping. Check `active_buy_order_id()`
    /// first: a none sentinel yields a missing-entity error.
    pub fn active_buy_order_data<'a>(&self, book: &'a OrderBook) -> Result<&'a Order, SimError> {
        if self.active_buy_order_id == ORDER_ID_NONE {
            return Err(SimError::NoActiveOrder { side: Side::Buy });
        }
        book.order(self.active_buy_order_id)
            .ok_or(SimError::NoActiveOrder { side: Side::Buy })
    }

    pub fn active_sell_order_data<'a>(&self, book: &'a OrderBook) -> Result<&'a Order, SimError> {
        if self.active_sell_order_id == ORDER_ID_NONE {
            return Err(SimError::NoActiveOrder { side: Side::Sell });
        }
        book.order(self.active_sell_order_id)
            .ok_or(SimError::NoActiveOrder { side: Side::Sell })
    }

    /// Pending buy pongs, cheapest first.
    pub fn buy_pongs_list(&self) -> Vec<PongEntry> {
        let mut entries: Vec<_> = self.buy_pongs.iter().map(|Reverse(e)| *e).collect();
        entries.sort();
        entries
    }

    /// Pending sell pongs, dearest first.
    pub fn sell_pongs_list(&self) -> Vec<PongEntry> {
        let mut entries: Vec<_> = self.sell_pongs.iter().copied().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries
    }

    pub fn latency_queue(&self) -> &LatencyQueue {
        &self.latency
    }

    pub fn latency_queue_mut(&mut self) -> &mut LatencyQueue {
        &mut self.latency
    }

    /// Atomically replace the full latency profile from the ten raw
    /// bounds, in action-type order.
    #[allow(clippy::too_many_arguments)]
    pub fn set_latency_config(
        &mut self,
        order_send_min: i64,
        order_send_max: i64,
        cancel_min: i64,
        cancel_max: i64,
        modify_min: i64,
        modify_max: i64,
        acknowledge_fill_min: i64,
        acknowledge_fill_max: i64,
        market_update_min: i64,
        market_update_max: i64,
    ) -> Result<(), SimError> {
        self.latency.reset_latency_profile(LatencyProfile::from_bounds(
            order_send_min,
            order_send_max,
            cancel_min,
            cancel_max,
            modify_min,
            modify_max,
            acknowledge_fill_min,
            acknowledge_fill_max,
            market_update_min,
            market_update_max,
        ))
    }
}
