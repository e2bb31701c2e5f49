use serde::{Deserialize, Serialize};

use crate::{OrderId, PriceTick, Qty, TsMicros};

/// Immutable execution record.
///
/// `was_instant` is true for trades generated synchronously while an
/// incoming order crossed the book, and false for trades produced by the
/// simulated-fill path. A synthetic counterparty (the simulated market)
/// carries `ORDER_ID_NONE` on its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: u64,
    pub price_tick: PriceTick,
    pub quantity: Qty,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub timestamp_us: TsMicros,
    pub was_instant: bool,
}

/// Append-only trade record. The order book is the sole producer; trade
/// ids are monotonic across the whole simulation.
#[derive(Debug, Default)]
pub struct TradeLog {
    trades: Vec<Trade>,
    next_trade_id: u64,
}

impl TradeLog {
    pub fn new() -> Self {
        Self { trades: Vec::new(), next_trade_id: 1 }
    }

    /// Append a trade, assigning the next trade id. Returns a copy of the
    /// stored record.
    pub fn record(
        &mut self,
        price_tick: PriceTick,
        quantity: Qty,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        timestamp_us: TsMicros,
        was_instant: bool,
    ) -> Trade {
        let trade = Trade {
            trade_id: self.next_trade_id,
            price_tick,
            quantity,
            buy_order_id,
            sell_order_id,
            timestamp_us,
            was_instant,
        };
        self.next_trade_id += 1;
        self.trades.push(trade);
        trade
    }

    pub fn get(&self, index: usize) -> Option<&Trade> {
        self.trades.get(index)
    }

    pub fn last(&self) -> Option<&Trade> {
        self.trades.last()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Report every recorded trade through the tracing subscriber.
    pub fn log_trades(&self) {
        for t in &self.trades {
            tracing::info!(
                trade_id = t.trade_id,
                price_tick = t.price_tick,
                quantity = t.quantity,
                buy_order_id = t.buy_order_id,
                sell_order_id = t.sell_order_id,
                timestamp_us = t.timestamp_us,
                was_instant = t.was_instant,
                "trade"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_ids_are_monotonic_from_one() {
        let mut log = TradeLog::new();
        let t1 = log.record(100, 3, 2, 1, 1000, true);
        let t2 = log.record(101, 2, 4, 3, 1001, false);

        assert_eq!(t1.trade_id, 1);
        assert_eq!(t2.trade_id, 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0).unwrap().price_tick, 100);
        assert_eq!(log.last().unwrap().price_tick, 101);
    }
}
