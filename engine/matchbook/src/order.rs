use serde::{Deserialize, Serialize};

use crate::{OrderId, PriceTick, Qty, Side, TsMicros};

/// A limit order. `quantity` is the remaining open quantity; it only ever
/// decreases through matching (or `modify_order`), and an order whose
/// quantity reaches zero is inactive and absent from the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price_tick: PriceTick,
    pub quantity: Qty,
    pub is_active: bool,
    pub ts_created_us: TsMicros,
    pub ts_last_update_us: TsMicros,
}

impl Order {
    pub fn new(
        id: OrderId,
        side: Side,
        price_tick: PriceTick,
        quantity: Qty,
        ts: TsMicros,
    ) -> Self {
        Self {
            id,
            side,
            price_tick,
            quantity,
            is_active: true,
            ts_created_us: ts,
            ts_last_update_us: ts,
        }
    }
}
