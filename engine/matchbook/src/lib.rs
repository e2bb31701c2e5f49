//! # Matchbook
//!
//! Price-time-priority limit order book for the ping-pong strategy
//! simulator.
//!
//! Core features:
//! - Price-time priority matching (best price first, then FIFO)
//! - Partial fills and immediate execution at the resting order's price
//! - IOC orders that never rest
//! - O(log P) cancel/modify through an order-id index
//! - Append-only trade log with monotonic trade ids
//!
//! Self-matching is allowed: the simulator has a single participant, so
//! no prevention logic exists.

mod error;
mod level;
mod order;
mod trade;
mod types;

pub use error::BookError;
pub use level::Level;
pub use order::Order;
pub use trade::{Trade, TradeLog};
pub use types::{OrderId, PriceTick, Qty, Side, TsMicros, ORDER_ID_NONE};

use std::collections::BTreeMap;

/// Result of submitting a limit order.
///
/// A fresh id is always assigned, even when the order fills entirely on
/// submission; in that case `resting_qty` is zero and the order is
/// inactive and absent from the book.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub order_id: OrderId,
    pub resting_qty: Qty,
    pub trades: Vec<Trade>,
}

/// Result of an IOC submission. The unfilled remainder is discarded,
/// never rested.
#[derive(Debug, Clone)]
pub struct IocOutcome {
    pub order_id: OrderId,
    pub filled_qty: Qty,
    pub trades: Vec<Trade>,
}

/// Aggregate view of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LevelSummary {
    pub price_tick: PriceTick,
    pub total_qty: u64,
    pub order_count: usize,
}

/// Point-in-time view of the book: best quotes plus per-side depth
/// ladders, best price first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BookSnapshot {
    pub best_bid: Option<LevelSummary>,
    pub best_ask: Option<LevelSummary>,
    pub bid_depth: Vec<LevelSummary>,
    pub ask_depth: Vec<LevelSummary>,
}

/// Central limit order book with separate bid/ask ladders and an
/// order-id index.
///
/// Invariants: when both sides are non-empty, `best_bid < best_ask`
/// (crossing liquidity is consumed on submission). Every active order
/// appears in exactly one price level, and the id index agrees with the
/// level contents; disagreement is fatal.
pub struct OrderBook {
    bids: BTreeMap<PriceTick, Level>,
    asks: BTreeMap<PriceTick, Level>,
    /// order id -> (side, resting price). BTreeMap so open-order
    /// iteration is deterministic (ascending id).
    lookup: BTreeMap<OrderId, (Side, PriceTick)>,
    trade_log: TradeLog,
    next_order_id: OrderId,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            lookup: BTreeMap::new(),
            trade_log: TradeLog::new(),
            next_order_id: 1,
        }
    }

    /// Submit a limit order.
    ///
    /// Crossing quantity is consumed FIFO from the opposite side, each
    /// match printing at the resting order's price with
    /// `was_instant = true`. Any residual rests at `price_tick`.
    pub fn add_limit_order(
        &mut self,
        side: Side,
        price_tick: PriceTick,
        quantity: Qty,
        ts: TsMicros,
    ) -> Result<SubmitOutcome, BookError> {
        if price_tick <= 0 {
            return Err(BookError::InvalidPrice(price_tick));
        }
        if quantity == 0 {
            return Err(BookError::InvalidQuantity);
        }

        let order_id = self.alloc_order_id();
        let (remaining, trades) =
            self.execute_match(side, order_id, Some(price_tick), quantity, ts);

        if remaining > 0 {
            let ladder = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            ladder
                .entry(price_tick)
                .or_insert_with(Level::new)
                .push(Order::new(order_id, side, price_tick, remaining, ts));
            self.lookup.insert(order_id, (side, price_tick));
        }

        Ok(SubmitOutcome { order_id, resting_qty: remaining, trades })
    }

    /// Submit an immediate-or-cancel order.
    ///
    /// Walks the opposite side at progressively worse prices until the
    /// quantity is exhausted or the book is empty. An empty book fills
    /// nothing and is not an error.
    pub fn add_ioc_order(
        &mut self,
        side: Side,
        quantity: Qty,
        ts: TsMicros,
    ) -> Result<IocOutcome, BookError> {
        if quantity == 0 {
            return Err(BookError::InvalidQuantity);
        }

        let order_id = self.alloc_order_id();
        let (remaining, trades) = self.execute_match(side, order_id, None, quantity, ts);

        Ok(IocOutcome { order_id, filled_qty: quantity - remaining, trades })
    }

    /// Cancel an order. Returns false (idempotently, with no state
    /// change) when the id is unknown or already inactive.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        let Some((side, price_tick)) = self.lookup.remove(&order_id) else {
            return false;
        };
        let mut order = self.take_from_level(side, price_tick, order_id);
        order.is_active = false;
        true
    }

    /// Change an order's quantity.
    ///
    /// A reduction is applied in place, preserving time priority. An
    /// increase re-queues the order at the tail of its price level
    /// (cancel + re-submit semantics: priority lost, id kept). Returns
    /// `Ok(false)` when the id is unknown or inactive.
    pub fn modify_order(
        &mut self,
        order_id: OrderId,
        new_quantity: Qty,
        ts: TsMicros,
    ) -> Result<bool, BookError> {
        if new_quantity == 0 {
            return Err(BookError::InvalidQuantity);
        }
        let Some(&(side, price_tick)) = self.lookup.get(&order_id) else {
            return Ok(false);
        };

        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = ladder
            .get_mut(&price_tick)
            .unwrap_or_else(|| panic!("order index points at missing level for order {order_id}"));
        let pos = level
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .unwrap_or_else(|| panic!("order index and price level disagree for {order_id}"));
        let current = level.orders[pos].quantity;

        if new_quantity <= current {
            let order = &mut level.orders[pos];
            order.quantity = new_quantity;
            order.ts_last_update_us = ts;
            level.adjust_total(i64::from(new_quantity) - i64::from(current));
        } else {
            let mut order = level.orders.remove(pos).expect("position located above");
            level.adjust_total(-i64::from(current));
            order.quantity = new_quantity;
            order.ts_last_update_us = ts;
            level.push(order);
        }
        Ok(true)
    }

    /// Execute a simulated fill against a resting order: the whole
    /// remaining quantity trades at the order's own price against a
    /// synthetic counterparty (`ORDER_ID_NONE`), and the order leaves
    /// the book. Returns None when the id is unknown or inactive.
    pub fn fill_resting_order(&mut self, order_id: OrderId, ts: TsMicros) -> Option<Trade> {
        let (side, price_tick) = self.lookup.remove(&order_id)?;
        let mut order = self.take_from_level(side, price_tick, order_id);
        order.is_active = false;

        let (buy_id, sell_id) = match side {
            Side::Buy => (order_id, ORDER_ID_NONE),
            Side::Sell => (ORDER_ID_NONE, order_id),
        };
        Some(self.trade_log.record(price_tick, order.quantity, buy_id, sell_id, ts, false))
    }

    pub fn snapshot(&self) -> BookSnapshot {
        let summarize = |price: PriceTick, level: &Level| LevelSummary {
            price_tick: price,
            total_qty: level.total_qty(),
            order_count: level.len(),
        };
        BookSnapshot {
            best_bid: self.best_bid().map(|(p, l)| summarize(p, l)),
            best_ask: self.best_ask().map(|(p, l)| summarize(p, l)),
            bid_depth: self.bids.iter().rev().map(|(&p, l)| summarize(p, l)).collect(),
            ask_depth: self.asks.iter().map(|(&p, l)| summarize(p, l)).collect(),
        }
    }

    /// Best bid: highest-priced bid level.
    pub fn best_bid(&self) -> Option<(PriceTick, &Level)> {
        self.bids.iter().next_back().map(|(&p, l)| (p, l))
    }

    /// Best ask: lowest-priced ask level.
    pub fn best_ask(&self) -> Option<(PriceTick, &Level)> {
        self.asks.iter().next().map(|(&p, l)| (p, l))
    }

    /// Integer mid price; None unless both sides are populated.
    pub fn mid_price(&self) -> Option<PriceTick> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some((bid + ask) / 2),
            _ => None,
        }
    }

    pub fn spread_ticks(&self) -> Option<PriceTick> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn bids(&self) -> &BTreeMap<PriceTick, Level> {
        &self.bids
    }

    pub fn asks(&self) -> &BTreeMap<PriceTick, Level> {
        &self.asks
    }

    /// The id index: order id -> (side, resting price).
    pub fn order_lookup(&self) -> &BTreeMap<OrderId, (Side, PriceTick)> {
        &self.lookup
    }

    /// Look up an active order by id.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        let &(side, price_tick) = self.lookup.get(&order_id)?;
        let ladder = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let level = ladder
            .get(&price_tick)
            .unwrap_or_else(|| panic!("order index points at missing level for order {order_id}"));
        let order = level
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .unwrap_or_else(|| panic!("order index and price level disagree for {order_id}"));
        Some(order)
    }

    /// All open orders as (id, side, price, qty), ascending id. The
    /// fixed iteration order keeps downstream random sampling
    /// reproducible.
    pub fn resting_orders(&self) -> Vec<(OrderId, Side, PriceTick, Qty)> {
        self.lookup
            .iter()
            .map(|(&id, &(side, price))| {
                let qty = self
                    .order(id)
                    .unwrap_or_else(|| panic!("order index holds stale id {id}"))
                    .quantity;
                (id, side, price, qty)
            })
            .collect()
    }

    pub fn trade_log(&self) -> &TradeLog {
        &self.trade_log
    }

    pub fn open_order_count(&self) -> usize {
        self.lookup.len()
    }

    fn alloc_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    /// Consume crossing liquidity FIFO from the opposite side. With a
    /// price limit this is the limit-order cross; without one it is the
    /// IOC walk. Returns the unfilled remainder and the trades printed.
    fn execute_match(
        &mut self,
        taker_side: Side,
        taker_id: OrderId,
        price_limit: Option<PriceTick>,
        quantity: Qty,
        ts: TsMicros,
    ) -> (Qty, Vec<Trade>) {
        let mut remaining = quantity;
        let mut trades = Vec::new();

        while remaining > 0 {
            let best_px = match taker_side {
                Side::Buy => self.asks.keys().next().copied(),
                Side::Sell => self.bids.keys().next_back().copied(),
            };
            let Some(best_px) = best_px else { break };

            if let Some(limit) = price_limit {
                let crosses = match taker_side {
                    Side::Buy => limit >= best_px,
                    Side::Sell => limit <= best_px,
                };
                if !crosses {
                    break;
                }
            }

            let (maker_id, fill, maker_done) = {
                let ladder = match taker_side {
                    Side::Buy => &mut self.asks,
                    Side::Sell => &mut self.bids,
                };
                let level = ladder.get_mut(&best_px).expect("best price has a level");
                let maker = level.orders.front_mut().expect("level in ladder is never empty");
                let fill = remaining.min(maker.quantity);
                maker.quantity -= fill;
                maker.ts_last_update_us = ts;
                let maker_id = maker.id;
                let maker_done = maker.quantity == 0;
                level.total_qty -= u64::from(fill);
                if maker_done {
                    let mut done = level.orders.pop_front().expect("front exists");
                    done.is_active = false;
                }
                if level.orders.is_empty() {
                    ladder.remove(&best_px);
                }
                (maker_id, fill, maker_done)
            };
            if maker_done {
                self.lookup.remove(&maker_id);
            }
            remaining -= fill;

            let (buy_id, sell_id) = match taker_side {
                Side::Buy => (taker_id, maker_id),
                Side::Sell => (maker_id, taker_id),
            };
            trades.push(self.trade_log.record(best_px, fill, buy_id, sell_id, ts, true));
        }

        (remaining, trades)
    }

    fn take_from_level(&mut self, side: Side, price_tick: PriceTick, order_id: OrderId) -> Order {
        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = ladder
            .get_mut(&price_tick)
            .unwrap_or_else(|| panic!("order index points at missing level for order {order_id}"));
        let order = level
            .remove(order_id)
            .unwrap_or_else(|| panic!("order index and price level disagree for {order_id}"));
        if level.is_empty() {
            ladder.remove(&price_tick);
        }
        order
    }

}
