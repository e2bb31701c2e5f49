use core::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique order identity, assigned monotonically starting at 1.
pub type OrderId = u64;
/// Share quantity. Promoted to 64-bit before any multiplication with prices.
pub type Qty = u32;
/// Price in integer ticks.
pub type PriceTick = i64;
/// Simulation timestamp in microseconds.
pub type TsMicros = i64;

/// Reserved "no order" sentinel. Never assigned to a real order.
pub const ORDER_ID_NONE: OrderId = 0;

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}
